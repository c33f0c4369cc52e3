//! Engine state — plain data mutated only by the polling-context engine.
//!
//! These structs are the working memory of the signal chain.  Nothing here
//! is shared with the interrupt context; the only cross-context state lives
//! in [`crate::sensors::antenna`] (sample cell) and
//! [`crate::drivers::button`] (press timestamp).

// ---------------------------------------------------------------------------
// Frequency processing state
// ---------------------------------------------------------------------------

/// Smoothed frequency, the two baselines, and the stability bookkeeping.
///
/// Invariant: once `baseline_set` is true, `frozen_base_freq` and
/// `smoothed_base_freq` move only through the blender, the static adjuster,
/// or manual recalibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyState {
    /// Smoothed current frequency (Hz per sampling window).
    pub smoothed_freq: f32,
    /// Long-run baseline, blended continuously toward the current frequency.
    pub smoothed_base_freq: f32,
    /// Frozen baseline snapshot — the anchor deltas are measured against.
    pub frozen_base_freq: f32,
    /// Last output of the delta filter.
    pub last_smoothed_delta: f32,
    /// Reference delta for the stability judge.
    pub last_stable_delta: f32,
    /// Previous raw pulse count.
    pub last_raw_freq: f32,
    /// Sample-to-sample raw change.
    pub delta_rate: f32,
    /// Timestamp of the last frozen-baseline re-anchor.
    pub last_frozen_update_ms: u32,
    /// Consecutive near-equal deltas (capped at the stable window).
    pub stable_count: u16,
    /// True once the startup baseline has committed; never cleared.
    pub baseline_set: bool,
    /// True once the frequency filter has been seeded with a real sample.
    pub primed: bool,
}

// ---------------------------------------------------------------------------
// Gaze output state
// ---------------------------------------------------------------------------

/// Discretized gaze output, recomputed every sampling period.
#[derive(Debug, Clone, Copy, Default)]
pub struct EyeState {
    /// Raw mapped gaze index (0–8).
    pub looking: u8,
    /// Exponentially smoothed gaze index; truncated for the public reading.
    pub smoothed_looking: f32,
    /// Deviation direction: −1, 0, or 1 (0 inside the dead zone).
    pub direction: i8,
}

// ---------------------------------------------------------------------------
// Environment jitter state
// ---------------------------------------------------------------------------

/// Ambient-noise classification state.
///
/// Invariant: `env_count` stays within `[0, env_window]` and is updated at
/// most once per `env_check_interval_ms`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentState {
    /// True while the detector classifies the signal as ambient jitter.
    pub is_environmental_jitter: bool,
    /// deltaRate seen at the previous detector run.
    pub last_delta_rate: f32,
    /// Bounded sign-change accumulator.
    pub env_count: u16,
    /// Hysteresis: consecutive jitter-positive runs (diagnostics only).
    pub env_stable_counter: u16,
    /// Hysteresis: consecutive jitter-negative runs (diagnostics only).
    pub env_clear_counter: u16,
    /// Timestamp gate for the detector interval.
    pub last_sign_check_ms: u32,
}

// ---------------------------------------------------------------------------
// Static baseline adjustment state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAdjustState {
    /// Signed deviation from the previous period.
    pub last_delta_raw: f32,
    /// Bounded accumulator of held-still samples.
    pub static_count: u16,
}

// ---------------------------------------------------------------------------
// Baseline initialization scratch state
// ---------------------------------------------------------------------------

/// Consumed once by the baseline initializer, then irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitState {
    /// Settle-band reference frequency.
    pub freq_at_startup: f32,
    /// Consecutive samples inside the settle band.
    pub init_count: u16,
}
