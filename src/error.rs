#![allow(dead_code)] // Comms variants only reachable on the espidf radio path

//! Unified error types for the ThereminEye firmware.
//!
//! A single `Error` enum every subsystem can convert into, keeping the
//! top-level error handling uniform.  All variants are `Copy` so they can be
//! passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// WiFi stack bring-up failed (required before ESP-NOW).
    WifiInitFailed(i32),
    /// ESP-NOW initialisation failed.
    EspNowInitFailed(i32),
    /// Registering the broadcast peer failed.
    PeerAddFailed(i32),
    /// A frame could not be queued for transmission.
    SendFailed(i32),
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiInitFailed(rc) => write!(f, "WiFi init failed (rc={rc})"),
            Self::EspNowInitFailed(rc) => write!(f, "ESP-NOW init failed (rc={rc})"),
            Self::PeerAddFailed(rc) => write!(f, "peer add failed (rc={rc})"),
            Self::SendFailed(rc) => write!(f, "send failed (rc={rc})"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
