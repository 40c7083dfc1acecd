//! Error taxonomy for the control path
//!
//! Decode anomalies and routing misses are not errors: the decoder classifies
//! unknown bytes as `MessageKind::Unknown` and the router reports
//! `RouteOutcome::Ignored`. A user shutdown is the main loop's normal exit and
//! returns `Ok`. Only transport conditions surface here.

use thiserror::Error;

/// Errors raised by the MIDI transport
#[derive(Debug, Error)]
pub enum ControlError {
    /// A device could not be opened; it is excluded for the session
    #[error("MIDI device {id} ({name}) unavailable: {reason}")]
    DeviceUnavailable { id: usize, name: String, reason: String },

    /// The MIDI backend itself could not be initialized
    #[error("MIDI transport initialization failed: {0}")]
    TransportInit(String),
}

pub type ControlResult<T> = std::result::Result<T, ControlError>;
