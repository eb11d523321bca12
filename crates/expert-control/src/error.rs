//! Error types for transport and control

use std::time::Duration;

use thiserror::Error;

use expert_proto::{DecodeError, EncodeError};

/// Errors that can occur while talking to the amplifier
#[derive(Debug, Error)]
pub enum ControlError {
    /// No status broadcast arrived within the caller's deadline
    #[error("timed out after {0:?} waiting for a status broadcast")]
    Timeout(Duration),

    /// No device address known yet
    #[error("no device address known; run discovery or configure one")]
    NoDevice,

    /// Status frame could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Command could not be encoded (unsupported channel)
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Socket or send failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
