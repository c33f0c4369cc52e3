//! Baseline management: one-shot startup initialization, static nudging
//! while the hand is away, and the continuous three-factor adaptive blend.
//!
//! Two baselines exist on purpose.  `smoothed_base_freq` is the long-run
//! estimate and follows the current frequency at an adaptive rate;
//! `frozen_base_freq` is the slower anchor that deltas are measured
//! against, decoupled so the output does not feed back into its own
//! reference.  The blender re-anchors the frozen value quickly during
//! qualifying rest periods and otherwise drifts it toward the long-run
//! estimate at a rate that shrinks with the deviation — the anchor can lag
//! but never permanently desynchronize.

use crate::config::SystemConfig;
use crate::engine::state::{FrequencyState, InitState, StaticAdjustState};

// ───────────────────────────────────────────────────────────────
// Startup initializer
// ───────────────────────────────────────────────────────────────

/// Freezes the initial baseline once the incoming frequency is plausible
/// and has settled.  Active only while `baseline_set` is false; commits
/// terminally.
#[derive(Debug, Clone, Copy)]
pub struct BaselineInitializer {
    min_freq: f32,
    settle_band: f32,
    settle_count: u16,
}

impl BaselineInitializer {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            min_freq: cfg.baseline_min_freq,
            settle_band: cfg.baseline_settle_band,
            settle_count: cfg.baseline_settle_count,
        }
    }

    /// Feed one smoothed sample.  Returns `true` on the committing sample.
    ///
    /// Samples at or below the plausibility floor are ignored entirely; a
    /// sample outside the settle band re-seeds the reference rather than
    /// failing.
    pub fn update(&self, smoothed_freq: f32, init: &mut InitState, freq: &mut FrequencyState) -> bool {
        if freq.baseline_set || smoothed_freq <= self.min_freq {
            return false;
        }

        if init.freq_at_startup == 0.0 {
            init.freq_at_startup = smoothed_freq;
            init.init_count = 0;
        }

        if (smoothed_freq - init.freq_at_startup).abs() < self.settle_band {
            init.init_count += 1;
            if init.init_count >= self.settle_count {
                freq.smoothed_base_freq = smoothed_freq;
                freq.frozen_base_freq = smoothed_freq;
                freq.baseline_set = true;
                return true;
            }
        } else {
            init.freq_at_startup = smoothed_freq;
            init.init_count = 0;
        }
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Static adjuster
// ───────────────────────────────────────────────────────────────

/// During prolonged near-zero deviation, nudges the long-run baseline
/// toward the current frequency and snaps the frozen anchor.
#[derive(Debug, Clone, Copy)]
pub struct StaticBaselineAdjuster {
    delta_threshold: f32,
    delta_rate_max: f32,
    count_max: u16,
    penalty: u16,
}

/// Blend weight kept on the old baseline when a static nudge fires.
const STATIC_BLEND_KEEP: f32 = 0.8;

impl StaticBaselineAdjuster {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            delta_threshold: cfg.static_delta_threshold,
            delta_rate_max: cfg.static_delta_rate_max,
            count_max: cfg.static_count_max,
            penalty: cfg.static_penalty,
        }
    }

    /// Feed one period.  Returns `true` when a baseline nudge fired.
    pub fn update(
        &self,
        delta: f32,
        delta_rate: f32,
        st: &mut StaticAdjustState,
        freq: &mut FrequencyState,
    ) -> bool {
        if delta >= self.delta_threshold {
            // Not static — unconditional reset prevents stale accumulation
            // from firing later.
            st.static_count = 0;
            return false;
        }

        if delta_rate.abs() < self.delta_rate_max {
            st.static_count += 1;
        } else {
            // Noisy "false static" sample.
            st.static_count = st.static_count.saturating_sub(self.penalty);
        }

        if st.static_count > self.count_max {
            freq.smoothed_base_freq =
                STATIC_BLEND_KEEP * freq.smoothed_base_freq + (1.0 - STATIC_BLEND_KEEP) * freq.smoothed_freq;
            freq.frozen_base_freq = freq.smoothed_freq;
            st.static_count = 0;
            return true;
        }
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Adaptive blender
// ───────────────────────────────────────────────────────────────

/// Per-period diagnostics from the blender, surfaced in telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendDiagnostics {
    pub base_alpha: f32,
    pub env_factor: f32,
    pub hand_factor: f32,
    pub adaptive_alpha: f32,
}

/// Continuously blends the long-run baseline toward the current frequency.
///
/// The blend rate is fast when idle, boosted while ambient jitter is
/// detected (the reading is trustworthy noise around the true baseline),
/// and suppressed almost entirely — quadratically in the deviation — while
/// a directed hand motion is in progress.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveBaselineBlender {
    env_factor_value: f32,
    hand_factor_threshold: f32,
    frozen_update_interval_ms: u32,
    stable_window: u16,
}

const BASE_ALPHA_FLOOR: f32 = 0.05;
const BASE_ALPHA_PER_HZ: f32 = 0.01;
/// Fraction of the base alpha a saturated hand motion cancels.
const HAND_SUPPRESSION: f32 = 0.98;
const ALPHA_MIN: f32 = 0.002;
const ALPHA_MAX: f32 = 0.5;
/// Frozen anchor re-anchors only when the deviation is below this.
const FROZEN_REST_DELTA: f32 = 0.5;
/// Fraction of the stable window required for a qualifying rest period.
const FROZEN_STABLE_FRACTION: f32 = 0.7;
/// Anti-deadlock drift rate at delta ≤ 1 Hz; divided by larger deltas.
const FROZEN_DRIFT_ALPHA: f32 = 0.002;

impl AdaptiveBaselineBlender {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            env_factor_value: cfg.env_factor_value,
            hand_factor_threshold: cfg.hand_factor_threshold,
            frozen_update_interval_ms: cfg.frozen_update_interval_ms,
            stable_window: cfg.stable_window,
        }
    }

    /// Run one blend period.  `jitter` is the detector's current verdict.
    pub fn update(
        &self,
        now_ms: u32,
        delta: f32,
        jitter: bool,
        freq: &mut FrequencyState,
    ) -> BlendDiagnostics {
        let base_alpha = BASE_ALPHA_FLOOR + delta * BASE_ALPHA_PER_HZ;
        let env_factor = if jitter { self.env_factor_value } else { 0.0 };

        let hand_ratio = (delta / self.hand_factor_threshold).powi(2).min(1.0);
        let hand_factor = if jitter {
            0.0
        } else {
            base_alpha * HAND_SUPPRESSION * hand_ratio
        };

        let adaptive_alpha = (base_alpha + env_factor - hand_factor).clamp(ALPHA_MIN, ALPHA_MAX);

        // Frozen anchor: fast re-anchor while at rest, slow drift otherwise.
        let resting = delta <= FROZEN_REST_DELTA
            && f32::from(freq.stable_count) >= FROZEN_STABLE_FRACTION * f32::from(self.stable_window);
        if resting
            && now_ms.wrapping_sub(freq.last_frozen_update_ms) > self.frozen_update_interval_ms
        {
            freq.frozen_base_freq = freq.smoothed_freq;
            freq.last_frozen_update_ms = now_ms;
        } else {
            let drift = FROZEN_DRIFT_ALPHA / delta.max(1.0);
            freq.frozen_base_freq =
                drift * freq.smoothed_base_freq + (1.0 - drift) * freq.frozen_base_freq;
        }

        freq.smoothed_base_freq =
            adaptive_alpha * freq.smoothed_freq + (1.0 - adaptive_alpha) * freq.smoothed_base_freq;

        BlendDiagnostics {
            base_alpha,
            env_factor,
            hand_factor,
            adaptive_alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SystemConfig {
        SystemConfig::default()
    }

    // ── Initializer ───────────────────────────────────────────

    #[test]
    fn commits_after_settled_window() {
        let init = BaselineInitializer::from_config(&cfg());
        let mut st = InitState::default();
        let mut freq = FrequencyState::default();
        for i in 1..=10 {
            let committed = init.update(1050.0, &mut st, &mut freq);
            assert_eq!(committed, i == 10, "commit exactly at sample 10");
        }
        assert!(freq.baseline_set);
        assert!((freq.smoothed_base_freq - 1050.0).abs() < 1e-3);
        assert!((freq.frozen_base_freq - 1050.0).abs() < 1e-3);
    }

    #[test]
    fn implausibly_low_frequency_never_accumulates() {
        let init = BaselineInitializer::from_config(&cfg());
        let mut st = InitState::default();
        let mut freq = FrequencyState::default();
        for _ in 0..50 {
            assert!(!init.update(800.0, &mut st, &mut freq));
        }
        assert!(!freq.baseline_set);
        assert_eq!(st.init_count, 0);
    }

    #[test]
    fn out_of_band_sample_reseeds_reference() {
        let init = BaselineInitializer::from_config(&cfg());
        let mut st = InitState::default();
        let mut freq = FrequencyState::default();
        for _ in 0..5 {
            init.update(1050.0, &mut st, &mut freq);
        }
        assert_eq!(st.init_count, 5);
        init.update(1070.0, &mut st, &mut freq); // drifted out of the 5 Hz band
        assert_eq!(st.init_count, 0);
        assert!((st.freq_at_startup - 1070.0).abs() < 1e-3);
        assert!(!freq.baseline_set);
    }

    #[test]
    fn commit_is_terminal() {
        let init = BaselineInitializer::from_config(&cfg());
        let mut st = InitState::default();
        let mut freq = FrequencyState::default();
        for _ in 0..10 {
            init.update(1050.0, &mut st, &mut freq);
        }
        assert!(freq.baseline_set);
        assert!(!init.update(1200.0, &mut st, &mut freq));
        assert!((freq.smoothed_base_freq - 1050.0).abs() < 1e-3);
    }

    // ── Static adjuster ───────────────────────────────────────

    #[test]
    fn nudge_fires_after_held_still_window() {
        let adj = StaticBaselineAdjuster::from_config(&cfg());
        let mut st = StaticAdjustState::default();
        let mut freq = FrequencyState {
            smoothed_freq: 1060.0,
            smoothed_base_freq: 1050.0,
            frozen_base_freq: 1050.0,
            ..Default::default()
        };
        let mut fired = false;
        for _ in 0..=10 {
            fired = adj.update(1.0, 0.5, &mut st, &mut freq);
        }
        assert!(fired);
        assert_eq!(st.static_count, 0);
        // 0.8·1050 + 0.2·1060 = 1052
        assert!((freq.smoothed_base_freq - 1052.0).abs() < 1e-3);
        assert!((freq.frozen_base_freq - 1060.0).abs() < 1e-3);
    }

    #[test]
    fn noisy_samples_are_penalized() {
        let adj = StaticBaselineAdjuster::from_config(&cfg());
        let mut st = StaticAdjustState::default();
        let mut freq = FrequencyState::default();
        for _ in 0..5 {
            adj.update(1.0, 0.5, &mut st, &mut freq);
        }
        assert_eq!(st.static_count, 5);
        adj.update(1.0, 30.0, &mut st, &mut freq); // rate too high
        assert_eq!(st.static_count, 0); // 5 − penalty(10), floored
    }

    #[test]
    fn large_delta_resets_unconditionally() {
        let adj = StaticBaselineAdjuster::from_config(&cfg());
        let mut st = StaticAdjustState::default();
        let mut freq = FrequencyState::default();
        for _ in 0..8 {
            adj.update(1.0, 0.5, &mut st, &mut freq);
        }
        assert_eq!(st.static_count, 8);
        adj.update(5.0, 0.5, &mut st, &mut freq);
        assert_eq!(st.static_count, 0);
    }

    // ── Blender ───────────────────────────────────────────────

    #[test]
    fn alpha_is_clamped_to_working_range() {
        let b = AdaptiveBaselineBlender::from_config(&cfg());
        let mut freq = FrequencyState::default();
        // Huge delta, no jitter → hand suppression drives alpha to the floor
        // region; still within the clamp.
        let d = b.update(10_000, 100.0, false, &mut freq);
        assert!(d.adaptive_alpha >= ALPHA_MIN && d.adaptive_alpha <= ALPHA_MAX);
        // Huge delta with jitter → env boost, still clamped.
        let d = b.update(20_000, 100.0, true, &mut freq);
        assert!(d.adaptive_alpha <= ALPHA_MAX);
    }

    #[test]
    fn hand_motion_suppresses_baseline_follow() {
        let b = AdaptiveBaselineBlender::from_config(&cfg());
        let mut resting = FrequencyState {
            smoothed_freq: 1040.0,
            smoothed_base_freq: 1050.0,
            frozen_base_freq: 1050.0,
            ..Default::default()
        };
        let mut moving = resting;

        // At rest (delta 0) the baseline converges at base alpha.
        let d_rest = b.update(10_000, 0.0, false, &mut resting);
        // During a saturated hand move the follow is 98% cancelled.
        let d_hand = b.update(10_000, 6.0, false, &mut moving);
        assert!(d_hand.hand_factor > 0.0);
        assert!(d_hand.adaptive_alpha < d_rest.adaptive_alpha);
        let rest_step = (1050.0 - resting.smoothed_base_freq).abs();
        let hand_step = (1050.0 - moving.smoothed_base_freq).abs();
        assert!(hand_step < rest_step);
    }

    #[test]
    fn jitter_boosts_follow_and_disables_hand_factor() {
        let b = AdaptiveBaselineBlender::from_config(&cfg());
        let mut freq = FrequencyState::default();
        let d = b.update(10_000, 6.0, true, &mut freq);
        assert!((d.hand_factor - 0.0).abs() < 1e-9);
        assert!((d.env_factor - 0.2).abs() < 1e-6);
    }

    #[test]
    fn frozen_reanchors_only_after_interval_at_rest() {
        let c = cfg();
        let b = AdaptiveBaselineBlender::from_config(&c);
        let mut freq = FrequencyState {
            smoothed_freq: 1048.0,
            smoothed_base_freq: 1048.0,
            frozen_base_freq: 1050.0,
            stable_count: c.stable_window, // fully steady
            last_frozen_update_ms: 0,
            ..Default::default()
        };
        // Interval not yet elapsed → drift only.
        b.update(1000, 0.2, false, &mut freq);
        assert!((freq.frozen_base_freq - 1050.0).abs() < 0.1);
        // Past the interval → snap to the current frequency.
        b.update(3100, 0.2, false, &mut freq);
        assert!((freq.frozen_base_freq - freq.smoothed_freq).abs() < 1e-3);
        assert_eq!(freq.last_frozen_update_ms, 3100);
    }

    #[test]
    fn frozen_drift_slows_with_deviation_but_never_stops() {
        let b = AdaptiveBaselineBlender::from_config(&cfg());
        let mut near = FrequencyState {
            smoothed_freq: 1040.0,
            smoothed_base_freq: 1040.0,
            frozen_base_freq: 1050.0,
            ..Default::default()
        };
        let mut far = near;
        b.update(10_000, 1.0, false, &mut near);
        b.update(10_000, 10.0, false, &mut far);
        let near_step = (1050.0 - near.frozen_base_freq).abs();
        let far_step = (1050.0 - far.frozen_base_freq).abs();
        assert!(near_step > far_step, "larger deviation drifts the anchor more slowly");
        assert!(far_step > 0.0, "anchor never fully locks");
    }
}
