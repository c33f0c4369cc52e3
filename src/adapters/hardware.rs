//! Hardware adapter — bridges real peripherals to the engine port traits.
//!
//! Owns the antenna sensor and the PWM output, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs, so the adapter
//! itself is target-agnostic.

use crate::drivers::pwm_out::PwmOut;
use crate::engine::ports::{ActuatorPort, SensorPort};
use crate::sensors::AntennaSensor;

/// Concrete adapter combining all hardware behind the port traits.
pub struct HardwareAdapter {
    antenna: AntennaSensor,
    pwm: PwmOut,
}

impl HardwareAdapter {
    pub fn new(antenna: AntennaSensor, pwm: PwmOut) -> Self {
        Self { antenna, pwm }
    }

    /// Drive the control output to zero (shutdown / degraded mode).
    pub fn silence(&mut self) {
        self.pwm.silence();
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn take_sample(&mut self) -> Option<i32> {
        self.antenna.take_sample()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_duty(&mut self, duty: u8) {
        self.pwm.set(duty);
    }
}
