//! Status frame decoding
//!
//! The amplifier broadcasts a 598-byte status datagram roughly once per
//! second. Field offsets were recovered from packet captures:
//!
//! ```text
//! [19..50]   device name, null-padded UTF-8
//! [52..307]  channel table: 15 records of 17 bytes each; byte 0 is an
//!            ASCII '0'/'1' enabled flag, bytes 1..17 a null-padded name
//! [562]      power: bit 7
//! [563]      mute: bit 1; active channel index: bits 2-7
//! [565]      volume, raw byte (dB = raw / 2.0 - 97.5)
//! [596..598] CRC-16 over bytes 0..596, big-endian
//! ```
//!
//! A checksum mismatch does not reject the frame: the device itself
//! occasionally broadcasts transitional frames with a stale trailer, so
//! the mismatch is surfaced as a flag and left to the caller.

use std::collections::BTreeMap;

use tracing::trace;

use crate::checksum::crc16;
use crate::error::DecodeError;
use crate::volume::code_to_db;

/// Fixed length of a status datagram.
pub const STATUS_LEN: usize = 598;

/// Number of records in the channel table.
pub const CHANNEL_COUNT: usize = 15;

/// Offset of the null-padded device name.
pub const NAME_OFFSET: usize = 19;
/// Maximum device name length in bytes.
pub const NAME_LEN: usize = 31;
/// Offset of the first channel record.
pub const TABLE_OFFSET: usize = 52;
/// Length of one channel record (flag byte + 16-byte name).
pub const RECORD_LEN: usize = 17;
/// Offset of the power byte.
pub const POWER_OFFSET: usize = 562;
/// Offset of the shared mute/active-channel byte.
pub const MODE_OFFSET: usize = 563;
/// Offset of the raw volume byte.
pub const VOLUME_OFFSET: usize = 565;
/// Offset of the big-endian CRC trailer.
pub const CRC_OFFSET: usize = 596;

/// Power bit within the power byte.
pub const POWER_MASK: u8 = 0x80;
/// Mute bit within the mode byte.
pub const MUTE_MASK: u8 = 0x02;

/// Decoded snapshot of one status broadcast
///
/// Immutable value, rebuilt on every received frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// Device name, trimmed of padding
    pub device_name: String,
    /// Amplifier out of standby
    pub powered: bool,
    /// Outputs muted
    pub muted: bool,
    /// Active channel index (0-14); may name a channel that has no entry
    /// in [`StatusSnapshot::channels`]
    pub active_channel: u8,
    /// Volume in dB
    pub volume_db: f64,
    /// Enabled channels, index to display name, in index order
    pub channels: BTreeMap<u8, String>,
    /// Whether the CRC trailer matched the frame body
    pub checksum_valid: bool,
    /// Original frame bytes, kept for re-verification and diagnostics
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw: Vec<u8>,
}

/// Decode a status datagram into a [`StatusSnapshot`].
///
/// `data` must hold at least [`STATUS_LEN`] bytes; anything shorter is a
/// hard decode failure, never a partial snapshot. Oversized datagrams
/// are decoded from their first 598 bytes.
pub fn decode_status(data: &[u8]) -> Result<StatusSnapshot, DecodeError> {
    if data.len() < STATUS_LEN {
        return Err(DecodeError::Truncated {
            len: data.len(),
            needed: STATUS_LEN,
        });
    }
    let frame = &data[..STATUS_LEN];

    let device_name = trimmed_text(&frame[NAME_OFFSET..NAME_OFFSET + NAME_LEN], "device name")?;

    let mut channels = BTreeMap::new();
    for index in 0..CHANNEL_COUNT {
        let record = &frame[TABLE_OFFSET + index * RECORD_LEN..TABLE_OFFSET + (index + 1) * RECORD_LEN];
        match record[0] {
            b'0' => continue,
            b'1' => {
                let name = trimmed_text(&record[1..], "channel name")?;
                channels.insert(index as u8, name);
            }
            value => {
                return Err(DecodeError::InvalidChannelFlag {
                    index: index as u8,
                    value,
                })
            }
        }
    }

    let powered = frame[POWER_OFFSET] & POWER_MASK != 0;
    let muted = frame[MODE_OFFSET] & MUTE_MASK != 0;
    let active_channel = (frame[MODE_OFFSET] >> 2) & 0x3F;
    let volume_db = code_to_db(frame[VOLUME_OFFSET]);

    let stored = u16::from_be_bytes([frame[CRC_OFFSET], frame[CRC_OFFSET + 1]]);
    let computed = crc16(&frame[..CRC_OFFSET]);
    let checksum_valid = stored == computed;
    if !checksum_valid {
        trace!(stored, computed, "status frame checksum mismatch");
    }

    Ok(StatusSnapshot {
        device_name,
        powered,
        muted,
        active_channel,
        volume_db,
        channels,
        checksum_valid,
        raw: frame.to_vec(),
    })
}

/// Interpret a null-padded byte range as text.
fn trimmed_text(bytes: &[u8], field: &'static str) -> Result<String, DecodeError> {
    let end = bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end])
        .map(str::to_owned)
        .map_err(|_| DecodeError::InvalidText { field })
}
