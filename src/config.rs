//! System configuration parameters
//!
//! All tunable parameters for the ThereminEye signal chain.  Constructed
//! once at startup and never mutated at runtime — the engine receives a
//! clone and treats it as read-only.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sampling ---
    /// Pulse-count sampling period (milliseconds).
    pub sampling_period_ms: u32,

    // --- Stability ---
    /// Consecutive near-equal deltas needed to declare "hand steady".
    pub stable_window: u16,
    /// Two deltas within this band (Hz) count as equal.
    pub stability_threshold: f32,
    /// Dead zone (Hz) inside which direction reads 0.
    pub direction_threshold: f32,

    // --- Output mapping ---
    /// Delta (Hz) mapping to duty 0 / looking 0.
    pub delta_f_min: f32,
    /// Delta (Hz) mapping to duty 255 / looking 8.
    pub delta_f_max: f32,
    /// EMA coefficient for the smoothed looking index.
    pub alpha_looking: f32,

    // --- Frequency filter (adaptive EMA) ---
    /// |Δ| above this (Hz) is a spike.
    pub freq_threshold_spike: f32,
    /// |Δ| at or below this (Hz) is in the small-move band.
    pub freq_threshold_medium: f32,
    /// Alpha applied to spikes.
    pub alpha_freq_spike: f32,
    /// Alpha applied to small moves (heavy smoothing).
    pub alpha_freq_small: f32,
    /// Base alpha for the proportional middle band.
    pub alpha_freq_base: f32,
    /// Per-Hz alpha growth in the middle band.
    pub alpha_freq_dynamic: f32,
    /// Alpha ceiling for the middle band.
    pub alpha_freq_max: f32,

    // --- Delta filter (adaptive EMA) ---
    pub alpha_delta_base: f32,
    pub alpha_delta_dynamic: f32,
    pub alpha_delta_max: f32,

    // --- Baseline initialization ---
    /// Frequencies at or below this (Hz) are startup transients.
    pub baseline_min_freq: f32,
    /// Settle band (Hz) around the startup reference.
    pub baseline_settle_band: f32,
    /// Consecutive settled samples required to commit the baseline.
    pub baseline_settle_count: u16,

    // --- Environment jitter detection ---
    /// Cap on the sign-change accumulator.
    pub env_window: u16,
    /// Cap on the jitter-stable hysteresis counter.
    pub env_stable_window: u16,
    /// Accumulator value at which jitter is declared.
    pub env_count_threshold: u16,
    /// Minimum interval between detector runs (milliseconds).
    pub env_check_interval_ms: u32,
    /// Clear-counter value that resets the stable counter.
    pub env_clear_threshold: u16,
    /// |deltaRate| above this (Hz/sample) is directed motion, not jitter.
    pub env_delta_rate_threshold: f32,

    // --- Static baseline adjustment ---
    /// Delta below this (Hz) counts as near-zero deviation.
    pub static_delta_threshold: f32,
    /// |deltaRate| cap for a sample to count as "held still".
    pub static_delta_rate_max: f32,
    /// Held-still samples needed to trigger a baseline nudge.
    pub static_count_max: u16,
    /// Accumulator penalty for a noisy sample.
    pub static_penalty: u16,

    // --- Adaptive baseline blending ---
    /// Master switch for the adaptive blender.
    pub auto_baseline: bool,
    /// Alpha boost while ambient jitter is detected.
    pub env_factor_value: f32,
    /// Delta (Hz) at which hand suppression saturates.
    pub hand_factor_threshold: f32,
    /// Minimum interval between frozen-baseline re-anchors (milliseconds).
    pub frozen_update_interval_ms: u32,

    // --- Broadcast ---
    /// Master switch for the ESP-NOW gaze broadcast task.
    pub broadcast_enabled: bool,
    /// Minimum interval between transmissions (milliseconds).
    pub broadcast_min_interval_ms: u32,

    // --- Telemetry ---
    /// Log one telemetry sample every N processed periods.
    pub telemetry_every_n_samples: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sampling_period_ms: 20, // 50 Hz

            // Stability
            stable_window: 20,
            stability_threshold: 0.2,
            direction_threshold: 0.2,

            // Output mapping
            delta_f_min: 4.0,
            delta_f_max: 12.0,
            alpha_looking: 0.2,

            // Frequency filter
            freq_threshold_spike: 50.0,
            freq_threshold_medium: 5.0,
            alpha_freq_spike: 0.05,
            alpha_freq_small: 0.08,
            alpha_freq_base: 0.10,
            alpha_freq_dynamic: 0.005,
            alpha_freq_max: 0.35,

            // Delta filter
            alpha_delta_base: 0.5,
            alpha_delta_dynamic: 0.05,
            alpha_delta_max: 0.7,

            // Baseline initialization
            baseline_min_freq: 1000.0,
            baseline_settle_band: 5.0,
            baseline_settle_count: 10,

            // Environment jitter
            env_window: 10,
            env_stable_window: 200,
            env_count_threshold: 2,
            env_check_interval_ms: 20,
            env_clear_threshold: 1,
            env_delta_rate_threshold: 15.0,

            // Static adjustment
            static_delta_threshold: 1.5,
            static_delta_rate_max: 20.0,
            static_count_max: 10,
            static_penalty: 10,

            // Adaptive blending
            auto_baseline: true,
            env_factor_value: 0.2,
            hand_factor_threshold: 3.0,
            frozen_update_interval_ms: 3000,

            // Broadcast
            broadcast_enabled: true,
            broadcast_min_interval_ms: 10,

            // Telemetry
            telemetry_every_n_samples: 5, // 100 ms at the 20 ms period
        }
    }
}

impl SystemConfig {
    /// Sanity-check the configuration.  Returns the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.sampling_period_ms == 0 {
            return Err("sampling_period_ms must be non-zero");
        }
        if self.delta_f_min >= self.delta_f_max {
            return Err("delta_f_min must be below delta_f_max");
        }
        if self.freq_threshold_medium >= self.freq_threshold_spike {
            return Err("freq_threshold_medium must be below freq_threshold_spike");
        }
        let alphas = [
            self.alpha_freq_spike,
            self.alpha_freq_small,
            self.alpha_freq_base,
            self.alpha_freq_max,
            self.alpha_delta_base,
            self.alpha_delta_max,
            self.alpha_looking,
        ];
        if alphas.iter().any(|a| !(0.0..=1.0).contains(a)) {
            return Err("EMA coefficients must lie in [0, 1]");
        }
        if self.stable_window == 0 || self.baseline_settle_count == 0 {
            return Err("window sizes must be non-zero");
        }
        if self.env_count_threshold > self.env_window {
            return Err("env_count_threshold cannot exceed env_window");
        }
        Ok(())
    }
}
