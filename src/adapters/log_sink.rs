//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured engine events to the
//! logger (UART / USB-CDC in production).  Telemetry arrives every
//! sampling period — far too fast for serial — so the sink surfaces every
//! N-th sample and passes discrete events straight through.

use log::{debug, info};

use crate::engine::events::EngineEvent;
use crate::engine::ports::EventSink;

/// Adapter that logs engine events to the serial console.
pub struct LogEventSink {
    every: u32,
    seen: u32,
}

impl LogEventSink {
    /// `every` — log one telemetry sample per that many processed periods.
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Telemetry(s) => {
                self.seen = self.seen.wrapping_add(1);
                if self.seen % self.every != 0 {
                    return;
                }
                debug!(
                    "TELEM | f={:.1} base={:.1}/{:.1} | d={:.2} dR={:.2} | L={} duty={} dir={} | \
                     sc={} env={}({}/{}/{}) st={} | a={:.4} (b={:.3} e={:.3} h={:.3})",
                    s.smoothed_freq,
                    s.smoothed_base_freq,
                    s.frozen_base_freq,
                    s.delta,
                    s.delta_rate,
                    s.looking,
                    s.duty,
                    s.direction,
                    s.stable_count,
                    u8::from(s.env_jitter),
                    s.env_count,
                    s.env_stable_counter,
                    s.env_clear_counter,
                    s.static_count,
                    s.adaptive_alpha,
                    s.base_alpha,
                    s.env_factor,
                    s.hand_factor,
                );
            }
            EngineEvent::BaselineInitialized { freq } => {
                info!("BASELINE | committed at {:.1}", freq);
            }
            EngineEvent::Recalibrated { freq } => {
                info!("RECAL | baseline snapped to {:.1}", freq);
            }
            EngineEvent::JitterChanged { active } => {
                info!("ENV | jitter {}", if *active { "detected" } else { "cleared" });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::EngineSample;

    #[test]
    fn telemetry_cadence_counts_samples() {
        // Smoke test: emitting must not panic and must honour every >= 1.
        let mut sink = LogEventSink::new(0); // clamped to 1
        for _ in 0..3 {
            sink.emit(&EngineEvent::Telemetry(EngineSample::default()));
        }
        sink.emit(&EngineEvent::JitterChanged { active: true });
    }
}
