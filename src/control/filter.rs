//! Adaptive exponential smoothing for the raw frequency and the deviation
//! magnitude, plus the clamped linear output mapping.
//!
//! Both filters trade smoothing against responsiveness by scaling the EMA
//! coefficient with the size of the move:
//!
//! ```text
//!   frequency:  |Δ| > spike      → alpha_spike   (distrust outliers)
//!               |Δ| ≤ medium     → alpha_small   (heavy anti-jitter)
//!               otherwise        → base + |Δ|·dynamic, capped at max
//!   delta:      base + delta·dynamic, capped at max
//! ```

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Frequency filter
// ───────────────────────────────────────────────────────────────

/// Adaptive EMA over the per-period pulse count.
#[derive(Debug, Clone, Copy)]
pub struct FreqFilter {
    spike_threshold: f32,
    medium_threshold: f32,
    alpha_spike: f32,
    alpha_small: f32,
    alpha_base: f32,
    alpha_dynamic: f32,
    alpha_max: f32,
}

impl FreqFilter {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            spike_threshold: cfg.freq_threshold_spike,
            medium_threshold: cfg.freq_threshold_medium,
            alpha_spike: cfg.alpha_freq_spike,
            alpha_small: cfg.alpha_freq_small,
            alpha_base: cfg.alpha_freq_base,
            alpha_dynamic: cfg.alpha_freq_dynamic,
            alpha_max: cfg.alpha_freq_max,
        }
    }

    /// Coefficient for a move of magnitude `diff`.
    pub fn alpha_for(&self, diff: f32) -> f32 {
        if diff > self.spike_threshold {
            self.alpha_spike
        } else if diff <= self.medium_threshold {
            self.alpha_small
        } else {
            (self.alpha_base + diff * self.alpha_dynamic).min(self.alpha_max)
        }
    }

    /// One smoothing step: `alpha·current + (1−alpha)·smoothed`.
    pub fn apply(&self, current: f32, smoothed: f32) -> f32 {
        let alpha = self.alpha_for((current - smoothed).abs());
        alpha * current + (1.0 - alpha) * smoothed
    }
}

// ───────────────────────────────────────────────────────────────
// Delta filter
// ───────────────────────────────────────────────────────────────

/// Adaptive EMA over the deviation magnitude.  Larger deviations are
/// tracked faster; at rest the filter is slow, suppressing noise in the
/// output mapping.
#[derive(Debug, Clone, Copy)]
pub struct DeltaFilter {
    alpha_base: f32,
    alpha_dynamic: f32,
    alpha_max: f32,
}

impl DeltaFilter {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            alpha_base: cfg.alpha_delta_base,
            alpha_dynamic: cfg.alpha_delta_dynamic,
            alpha_max: cfg.alpha_delta_max,
        }
    }

    pub fn alpha_for(&self, delta: f32) -> f32 {
        (self.alpha_base + delta * self.alpha_dynamic).min(self.alpha_max)
    }

    pub fn apply(&self, delta: f32, smoothed: f32) -> f32 {
        let alpha = self.alpha_for(delta);
        alpha * delta + (1.0 - alpha) * smoothed
    }
}

// ───────────────────────────────────────────────────────────────
// Output mapping
// ───────────────────────────────────────────────────────────────

/// Linear interpolation of `x` from `[in_min, in_max]` to
/// `[out_min, out_max]`.  Extrapolates outside the input range; callers
/// clamp the result.
pub fn linear_map(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Map a smoothed delta to an 8-bit PWM duty, hard-clamped at both ends.
pub fn map_duty(smoothed_delta: f32, delta_f_min: f32, delta_f_max: f32) -> u8 {
    linear_map(smoothed_delta, delta_f_min, delta_f_max, 0.0, 255.0)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Map a smoothed delta to the 0–8 gaze index, hard-clamped at both ends.
pub fn map_looking(smoothed_delta: f32, delta_f_min: f32, delta_f_max: f32) -> u8 {
    linear_map(smoothed_delta, delta_f_min, delta_f_max, 0.0, 8.0)
        .round()
        .clamp(0.0, 8.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq_filter() -> FreqFilter {
        FreqFilter::from_config(&SystemConfig::default())
    }

    #[test]
    fn small_moves_use_heavy_smoothing() {
        let f = freq_filter();
        assert!((f.alpha_for(2.0) - 0.08).abs() < 1e-6);
        assert!((f.alpha_for(5.0) - 0.08).abs() < 1e-6); // band edge inclusive
    }

    #[test]
    fn spikes_use_spike_alpha() {
        let f = freq_filter();
        assert!((f.alpha_for(80.0) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn middle_band_scales_and_caps() {
        let f = freq_filter();
        // 10 Hz → 0.10 + 10·0.005 = 0.15
        assert!((f.alpha_for(10.0) - 0.15).abs() < 1e-6);
        // 49 Hz → 0.345, just under the 0.35 cap and the 50 Hz spike edge
        assert!((f.alpha_for(49.0) - 0.345).abs() < 1e-6);
    }

    #[test]
    fn output_stays_between_input_and_previous() {
        let f = freq_filter();
        let out = f.apply(1100.0, 1000.0);
        assert!(out > 1000.0 && out < 1100.0);
        let out = f.apply(900.0, 1000.0);
        assert!(out > 900.0 && out < 1000.0);
    }

    #[test]
    fn delta_filter_tracks_large_deltas_faster() {
        let f = DeltaFilter::from_config(&SystemConfig::default());
        assert!(f.alpha_for(8.0) > f.alpha_for(1.0));
        // cap: 0.5 + 10·0.05 = 1.0 → clamped to 0.7
        assert!((f.alpha_for(10.0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn duty_mapping_clamps_both_ends() {
        assert_eq!(map_duty(0.0, 4.0, 12.0), 0);
        assert_eq!(map_duty(4.0, 4.0, 12.0), 0);
        assert_eq!(map_duty(12.0, 4.0, 12.0), 255);
        assert_eq!(map_duty(40.0, 4.0, 12.0), 255);
        assert_eq!(map_duty(8.0, 4.0, 12.0), 128);
    }

    #[test]
    fn looking_mapping_clamps_both_ends() {
        assert_eq!(map_looking(0.0, 4.0, 12.0), 0);
        assert_eq!(map_looking(12.0, 4.0, 12.0), 8);
        assert_eq!(map_looking(100.0, 4.0, 12.0), 8);
        assert_eq!(map_looking(8.0, 4.0, 12.0), 4);
    }
}
