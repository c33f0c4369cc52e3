//! Sensor subsystem.  The antenna oscillator is the system's only sensor;
//! its driver owns the interrupt/poll handoff cell.

pub mod antenna;

pub use antenna::AntennaSensor;
