//! Error types for protocol decoding and encoding

use thiserror::Error;

/// Errors that can occur while decoding a status frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Datagram shorter than a full status frame
    #[error("status frame too short: got {len} bytes, need {needed}")]
    Truncated { len: usize, needed: usize },

    /// A channel record carries something other than ASCII '0'/'1'
    #[error("channel record {index} has invalid enable flag 0x{value:02X}")]
    InvalidChannelFlag { index: u8, value: u8 },

    /// A text field is not valid UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidText { field: &'static str },
}

/// Errors that can occur while encoding a command frame
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The requested input has no known command selector
    #[error("channel {index} has no known command selector (reachable: 0-5, 14)")]
    UnsupportedChannel { index: u8 },
}
