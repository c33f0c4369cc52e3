//! Pure signal-processing components — no hardware, no I/O.
//!
//! Each component is a small struct of coefficients derived from
//! [`SystemConfig`](crate::config::SystemConfig) with an `apply`/`update`
//! method that mutates the engine state structs.  Everything here runs on
//! the host test target unchanged.

pub mod baseline;
pub mod filter;
pub mod jitter;
pub mod stability;
