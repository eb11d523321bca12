//! Expert Pro Amplifier Wire Protocol
//!
//! This crate provides decoding and encoding for the undocumented UDP
//! protocol spoken by the Expert Pro amplifier:
//!
//! - **Status frames**: 598-byte datagrams the amplifier broadcasts about
//!   once per second, carrying its name, power/mute state, active input
//!   channel, volume and the configured channel table
//! - **Command frames**: 142-byte datagrams that set power, mute, volume
//!   or the input channel; the device never acknowledges them
//!
//! The protocol was reverse-engineered from packet captures, and several
//! of its encodings are genuinely odd: volume uses a recursive bit-weight
//! decomposition on the command side but a plain affine byte formula on
//! the status side, and the input-channel selectors follow no formula at
//! all (one input even requires fixed magic bytes). Those quirks are
//! firmware behavior and are reproduced here exactly.
//!
//! This crate is pure codec: no sockets, no async, no retry policy. The
//! `expert-control` crate layers transport, discovery and the 4x
//! retransmission scheme on top of it.
//!
//! # Example
//!
//! ```rust
//! use expert_proto::{Command, CommandFrame};
//!
//! // Build a volume command template. Counter and checksum stay zero
//! // until the transport stamps them for each transmission attempt.
//! let mut frame = CommandFrame::encode(&Command::Volume { db: -20.0 }).unwrap();
//! frame.stamp(0);
//! assert_eq!(frame.as_bytes().len(), 142);
//! assert_eq!(&frame.as_bytes()[..2], &[0x44, 0x72]);
//! ```

pub mod channel;
pub mod checksum;
pub mod command;
pub mod error;
pub mod status;
pub mod volume;

pub use channel::{selector_for, Selector};
pub use checksum::crc16;
pub use command::{Command, CommandFrame, COMMAND_LEN};
pub use error::{DecodeError, EncodeError};
pub use status::{decode_status, StatusSnapshot, STATUS_LEN};
pub use volume::{code_to_db, db_to_code};
