//! Port traits — the boundary between the signal engine and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ThereminEngine (domain)
//! ```
//!
//! Driven adapters (the antenna sampler, the PWM output, telemetry sinks)
//! implement these traits.  The engine consumes them via generics, so the
//! core never touches hardware directly and the whole pipeline runs under
//! host tests with mock adapters.

use super::events::EngineEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the engine calls this once per polling iteration.
pub trait SensorPort {
    /// Atomically take the pending pulse count for the last sampling
    /// window, if one was published.  `None` means the period has not
    /// elapsed yet — a graceful no-op for the caller, not an error.
    ///
    /// The sampler may overwrite an unread count if the consumer falls
    /// behind; only the latest window matters.
    fn take_sample(&mut self) -> Option<i32>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the engine pushes the mapped control signal here.
pub trait ActuatorPort {
    /// Set the PWM control output (0–255).
    fn set_duty(&mut self, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`EngineEvent`]s through this port.
/// Adapters decide where they go — serial log, plotter stream, a future
/// RF side channel.  The engine itself stays free of presentation logic.
pub trait EventSink {
    fn emit(&mut self, event: &EngineEvent);
}
