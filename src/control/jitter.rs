//! Environment jitter detector.
//!
//! Ambient electrical noise shows up as small frequency changes whose sign
//! flips between checks; a hand moving toward or away from the antenna
//! produces a sustained same-direction rate.  The detector accumulates
//! sign oscillations into a bounded counter and declares jitter once it
//! crosses a threshold.  A single large rate is directed motion and wipes
//! any accumulated evidence immediately.
//!
//! The `env_stable_counter` / `env_clear_counter` pair smooths the boolean
//! for diagnostics; downstream logic reads `is_environmental_jitter`
//! directly.

use crate::config::SystemConfig;
use crate::engine::state::EnvironmentState;

#[derive(Debug, Clone, Copy)]
pub struct EnvJitterDetector {
    check_interval_ms: u32,
    delta_rate_threshold: f32,
    window: u16,
    count_threshold: u16,
    stable_window: u16,
    clear_threshold: u16,
}

impl EnvJitterDetector {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            check_interval_ms: cfg.env_check_interval_ms,
            delta_rate_threshold: cfg.env_delta_rate_threshold,
            window: cfg.env_window,
            count_threshold: cfg.env_count_threshold,
            stable_window: cfg.env_stable_window,
            clear_threshold: cfg.env_clear_threshold,
        }
    }

    /// Run the detector if the check interval has elapsed.
    ///
    /// Returns `true` when the classification was (re)evaluated this call.
    pub fn check(&self, now_ms: u32, delta_rate: f32, env: &mut EnvironmentState) -> bool {
        if now_ms.wrapping_sub(env.last_sign_check_ms) <= self.check_interval_ms {
            return false;
        }

        if delta_rate.abs() > self.delta_rate_threshold {
            // Directed motion overrides any accumulated jitter evidence.
            env.env_count = 0;
        } else if env.last_delta_rate != 0.0
            && delta_rate != 0.0
            && (env.last_delta_rate > 0.0) != (delta_rate > 0.0)
        {
            env.env_count = (env.env_count + 1).min(self.window);
        } else {
            // Same-sign or zero transition: decay evidence twice as fast
            // as it accumulates.
            env.env_count = env.env_count.saturating_sub(2);
        }

        env.last_delta_rate = delta_rate;
        env.last_sign_check_ms = now_ms;

        let jitter = env.env_count >= self.count_threshold;
        if jitter {
            env.env_stable_counter = (env.env_stable_counter + 1).min(self.stable_window);
            env.env_clear_counter = 0;
        } else {
            env.env_clear_counter = env.env_clear_counter.saturating_add(1);
            if env.env_clear_counter >= self.clear_threshold {
                env.env_stable_counter = 0;
            }
        }
        env.is_environmental_jitter = jitter;
        true
    }
}
