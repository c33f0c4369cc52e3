//! Stability judge — counts consecutive near-equal deltas to declare
//! "hand steady".  Consumed by the adaptive blender (frozen-baseline
//! re-anchor gate) and observable in telemetry.

use crate::config::SystemConfig;
use crate::engine::state::FrequencyState;

#[derive(Debug, Clone, Copy)]
pub struct StabilityJudge {
    threshold: f32,
    window: u16,
}

impl StabilityJudge {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            threshold: cfg.stability_threshold,
            window: cfg.stable_window,
        }
    }

    /// Advance the rolling steadiness counter with this period's delta.
    ///
    /// The first call after a reset seeds the reference; thereafter a delta
    /// within the threshold of the reference increments the counter (capped
    /// at the window) and any larger move resets it.  The reference follows
    /// the latest delta in both cases.
    pub fn update(&self, delta: f32, freq: &mut FrequencyState) {
        if freq.last_stable_delta == 0.0 {
            freq.last_stable_delta = delta;
            return;
        }

        if (delta - freq.last_stable_delta).abs() <= self.threshold {
            freq.stable_count = (freq.stable_count + 1).min(self.window);
        } else {
            freq.stable_count = 0;
        }
        freq.last_stable_delta = delta;
    }
}
