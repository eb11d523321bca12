//! Virtual amplifier state machine
//!
//! Tracks power/mute/channel/volume state, renders status frames with a
//! correct CRC trailer, and applies received command frames using the
//! same empirical encodings the real firmware uses (including the Phono
//! magic bytes and the halved payload for high selector codes). Every
//! received frame is also stored verbatim for test verification.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use expert_proto::channel::{selector_for, Selector, REACHABLE_INDICES};
use expert_proto::checksum::crc16;
use expert_proto::command::{self, kind, COMMAND_LEN, HEADER};
use expert_proto::status;
use expert_proto::volume::db_to_code;
use expert_proto::STATUS_LEN;

/// Virtual amplifier for testing
pub struct VirtualAmplifier {
    name: String,
    powered: bool,
    muted: bool,
    channel: u8,
    /// Volume as the raw status byte (dB = raw / 2.0 - 97.5)
    volume_raw: u8,
    channels: BTreeMap<u8, String>,
    /// Command frames received, valid or not (for test verification)
    received: Vec<Vec<u8>>,
}

impl VirtualAmplifier {
    /// Create a powered-on amplifier with a typical channel table.
    pub fn new(name: impl Into<String>) -> Self {
        let channels = [
            (0u8, "Optical 1"),
            (1, "Phono"),
            (2, "UPnP"),
            (3, "Roon Ready"),
            (4, "AirPlay"),
            (5, "Spotify"),
            (14, "Air"),
        ]
        .into_iter()
        .map(|(i, n)| (i, n.to_string()))
        .collect();

        Self {
            name: name.into(),
            powered: true,
            muted: false,
            channel: 0,
            volume_raw: 155, // -20.0 dB
            channels,
            received: Vec::new(),
        }
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Current volume as the raw status byte.
    pub fn volume_raw(&self) -> u8 {
        self.volume_raw
    }

    /// Set the volume from a dB value (multiples of 0.5 in -97.5..=30.0).
    pub fn set_volume_db(&mut self, db: f64) {
        self.volume_raw = ((db + 97.5) * 2.0).round() as u8;
    }

    /// Every command frame received so far, in arrival order.
    pub fn received(&self) -> &[Vec<u8>] {
        &self.received
    }

    /// Render the current state as a 598-byte status frame.
    pub fn status_frame(&self) -> Vec<u8> {
        let mut frame = vec![0u8; STATUS_LEN];

        let name = self.name.as_bytes();
        let len = name.len().min(status::NAME_LEN);
        frame[status::NAME_OFFSET..status::NAME_OFFSET + len].copy_from_slice(&name[..len]);

        for index in 0..status::CHANNEL_COUNT {
            let base = status::TABLE_OFFSET + index * status::RECORD_LEN;
            match self.channels.get(&(index as u8)) {
                Some(name) => {
                    frame[base] = b'1';
                    let bytes = name.as_bytes();
                    let len = bytes.len().min(status::RECORD_LEN - 1);
                    frame[base + 1..base + 1 + len].copy_from_slice(&bytes[..len]);
                }
                None => frame[base] = b'0',
            }
        }

        if self.powered {
            frame[status::POWER_OFFSET] |= status::POWER_MASK;
        }
        frame[status::MODE_OFFSET] = self.channel << 2;
        if self.muted {
            frame[status::MODE_OFFSET] |= status::MUTE_MASK;
        }
        frame[status::VOLUME_OFFSET] = self.volume_raw;

        let crc = crc16(&frame[..status::CRC_OFFSET]);
        frame[status::CRC_OFFSET..status::CRC_OFFSET + 2].copy_from_slice(&crc.to_be_bytes());
        frame
    }

    /// Apply a received command frame.
    ///
    /// Frames with a wrong length, header or checksum are recorded but
    /// not applied, the way the device silently drops them. Returns
    /// whether the frame was applied.
    pub fn apply_frame(&mut self, data: &[u8]) -> bool {
        self.received.push(data.to_vec());

        if data.len() != COMMAND_LEN || data[..2] != HEADER {
            trace!(len = data.len(), "dropping malformed command frame");
            return false;
        }
        let stored = u16::from_be_bytes([
            data[command::CHECKSUM_OFFSET],
            data[command::CHECKSUM_OFFSET + 1],
        ]);
        if crc16(&data[..command::CHECKSUM_OFFSET]) != stored {
            trace!("dropping command frame with bad checksum");
            return false;
        }

        let arg = data[command::ARG_OFFSET];
        let payload = [data[command::PAYLOAD_OFFSET], data[command::PAYLOAD_OFFSET + 1]];

        match data[command::KIND_OFFSET] {
            kind::POWER => {
                self.powered = arg != 0;
                debug!(on = self.powered, "sim power");
                true
            }
            kind::MUTE => {
                self.muted = arg != 0;
                debug!(on = self.muted, "sim mute");
                true
            }
            kind::VOLUME => {
                let code = u16::from_be_bytes(payload);
                match raw_for_code(code) {
                    Some(raw) => {
                        self.volume_raw = raw;
                        debug!(raw, "sim volume");
                        true
                    }
                    None => {
                        trace!(code, "volume code matches no known level");
                        false
                    }
                }
            }
            kind::CHANNEL => match channel_for_payload(payload) {
                Some(index) => {
                    self.channel = index;
                    debug!(index, "sim channel");
                    true
                }
                None => {
                    trace!(?payload, "channel payload matches no known selector");
                    false
                }
            },
            other => {
                trace!(kind = other, "unknown command kind");
                false
            }
        }
    }
}

/// Invert the command volume encoding over the device's reporting
/// range by scanning 0.5 dB steps.
fn raw_for_code(code: u16) -> Option<u8> {
    (0..=192u32).find_map(|halves| {
        let db = -(halves as f64) / 2.0;
        (db_to_code(db) == code).then_some((195 - halves) as u8)
    })
}

/// Invert the channel selector payload by scanning the lookup table.
fn channel_for_payload(payload: [u8; 2]) -> Option<u8> {
    REACHABLE_INDICES.iter().copied().find(|&index| {
        selector_for(index)
            .map(Selector::payload)
            .map(|p| p == payload)
            .unwrap_or(false)
    })
}
