//! Command frame construction
//!
//! Every command to the amplifier is a fixed 142-byte UDP datagram:
//!
//! ```text
//! [0..2]   header 0x44 0x72
//! [3]      packet counter (low byte)
//! [5]      packet counter >> 1 (low byte)
//! [6]      on/off argument (power, mute)
//! [7]      command kind: 0x01 power, 0x04 volume, 0x05 channel, 0x07 mute
//! [8..10]  16-bit payload, big-endian (volume code, channel selector)
//! [12..14] CRC-16 over bytes 0..12, big-endian
//! ```
//!
//! All other bytes are zero padding. The encoder produces a template
//! with the counter and checksum fields zeroed; the transport stamps
//! both for each of the four transmission attempts.

use crate::channel::selector_for;
use crate::checksum::crc16;
use crate::error::EncodeError;
use crate::volume::db_to_code;

/// Fixed length of a command datagram.
pub const COMMAND_LEN: usize = 142;

/// Fixed two-byte header of every command frame.
pub const HEADER: [u8; 2] = [0x44, 0x72];

/// Offset of the packet counter low byte.
pub const COUNTER_OFFSET: usize = 3;

/// Offset of the halved packet counter byte.
pub const COUNTER_HALF_OFFSET: usize = 5;

/// Offset of the on/off argument byte.
pub const ARG_OFFSET: usize = 6;

/// Offset of the command kind byte.
pub const KIND_OFFSET: usize = 7;

/// Offset of the 16-bit big-endian payload.
pub const PAYLOAD_OFFSET: usize = 8;

/// Offset of the big-endian CRC, computed over bytes `0..CHECKSUM_OFFSET`.
pub const CHECKSUM_OFFSET: usize = 12;

/// Command kind byte values.
pub mod kind {
    /// Power on/off (argument in byte 6)
    pub const POWER: u8 = 0x01;
    /// Set volume (code in bytes 8-9)
    pub const VOLUME: u8 = 0x04;
    /// Select input channel (selector in bytes 8-9)
    pub const CHANNEL: u8 = 0x05;
    /// Mute on/off (argument in byte 6)
    pub const MUTE: u8 = 0x07;
}

/// A logical command to the amplifier
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Enter or leave standby
    Power { on: bool },
    /// Mute or unmute the outputs
    Mute { on: bool },
    /// Set the volume in dB
    Volume { db: f64 },
    /// Switch to an input channel, by status-frame channel index
    Channel { index: u8 },
}

/// A 142-byte command frame template
///
/// Created once per logical command and mutated only through
/// [`CommandFrame::stamp`], which writes the counter fields and re-signs
/// the frame for one transmission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame([u8; COMMAND_LEN]);

impl CommandFrame {
    /// Build the frame template for a command.
    ///
    /// Fails only for a channel index with no known selector.
    pub fn encode(command: &Command) -> Result<Self, EncodeError> {
        let mut bytes = [0u8; COMMAND_LEN];
        bytes[..2].copy_from_slice(&HEADER);

        match *command {
            Command::Power { on } => {
                bytes[ARG_OFFSET] = on as u8;
                bytes[KIND_OFFSET] = kind::POWER;
            }
            Command::Mute { on } => {
                bytes[ARG_OFFSET] = on as u8;
                bytes[KIND_OFFSET] = kind::MUTE;
            }
            Command::Volume { db } => {
                bytes[KIND_OFFSET] = kind::VOLUME;
                let code = db_to_code(db);
                bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + 2].copy_from_slice(&code.to_be_bytes());
            }
            Command::Channel { index } => {
                let selector = selector_for(index)?;
                bytes[KIND_OFFSET] = kind::CHANNEL;
                bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + 2].copy_from_slice(&selector.payload());
            }
        }

        Ok(Self(bytes))
    }

    /// Stamp the frame for one transmission attempt.
    ///
    /// Writes the counter into bytes 3 and 5, then recomputes the CRC
    /// over bytes 0..12 into bytes 12-13. Each attempt of a command gets
    /// a distinct counter value, so each carries a distinct signature.
    pub fn stamp(&mut self, counter: u32) {
        self.0[COUNTER_OFFSET] = counter as u8;
        self.0[COUNTER_HALF_OFFSET] = (counter >> 1) as u8;
        let crc = crc16(&self.0[..CHECKSUM_OFFSET]);
        self.0[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&crc.to_be_bytes());
    }

    /// The raw frame bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
