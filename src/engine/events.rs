//! Outbound engine events.
//!
//! The [`ThereminEngine`](super::service::ThereminEngine) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  One
//! `Telemetry` sample goes out per processed period; sinks choose their
//! own cadence for surfacing them.

/// Structured events emitted by the signal engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Per-period telemetry snapshot.
    Telemetry(EngineSample),

    /// The startup baseline committed (terminal, once per boot).
    BaselineInitialized { freq: f32 },

    /// Manual recalibration snapped the baselines.
    Recalibrated { freq: f32 },

    /// The ambient-jitter classification flipped.
    JitterChanged { active: bool },
}

/// A point-in-time snapshot of every observable in the signal chain.
///
/// Carries everything the serial debug modes used to print: the frequency
/// triple, the deltas, the stability / environment / static counters, and
/// the blender's factor decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSample {
    pub raw_freq: f32,
    pub smoothed_freq: f32,
    pub smoothed_base_freq: f32,
    pub frozen_base_freq: f32,
    pub delta: f32,
    pub smoothed_delta: f32,
    pub delta_rate: f32,
    pub looking: u8,
    pub duty: u8,
    pub direction: i8,
    pub baseline_set: bool,
    pub stable_count: u16,
    pub env_jitter: bool,
    pub env_count: u16,
    pub env_stable_counter: u16,
    pub env_clear_counter: u16,
    pub static_count: u16,
    pub base_alpha: f32,
    pub env_factor: f32,
    pub hand_factor: f32,
    pub adaptive_alpha: f32,
}
