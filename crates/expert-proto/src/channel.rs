//! Input-channel selector mapping
//!
//! Status frames report input channels by a 0-14 index into the device's
//! channel table, but channel commands use a different, command-side
//! selector code. Nothing links the two arithmetically: the table below
//! was discovered empirically by sweeping selector values against a live
//! amplifier and watching which input engaged. Indices 6-13 never
//! responded to any selector and cannot be switched over the network.
//!
//! Phono (index 1) is the worst offender: no selector formula reaches
//! it at all, and the official control app sends the fixed payload
//! `0x3F 0x80` instead. That capture is reproduced verbatim here.

use crate::error::EncodeError;

/// Status-frame channel indices reachable over the network.
pub const REACHABLE_INDICES: [u8; 7] = [0, 1, 2, 3, 4, 5, 14];

/// Command-side selector for an input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Regular selector code, fed through the `0x4000 | (code << 5)`
    /// payload formula. Signed: Optical 1 answers to code -1.
    Standard(i8),
    /// Phono takes no selector code; the app sends fixed bytes.
    Phono,
}

/// Look up the command selector for a status-frame channel index.
///
/// Returns an error for indices the device does not expose over the
/// network; there is no fallback input.
pub fn selector_for(index: u8) -> Result<Selector, EncodeError> {
    match index {
        0 => Ok(Selector::Standard(-1)), // Optical 1
        1 => Ok(Selector::Phono),
        2 => Ok(Selector::Standard(0)), // UPnP
        3 => Ok(Selector::Standard(3)), // Roon Ready
        4 => Ok(Selector::Standard(4)), // AirPlay
        5 => Ok(Selector::Standard(5)), // Spotify
        14 => Ok(Selector::Standard(14)), // Air
        _ => Err(EncodeError::UnsupportedChannel { index }),
    }
}

impl Selector {
    /// Payload bytes 8-9 of a channel command frame.
    ///
    /// Standard codes go through `out = 0x4000 | (code << 5)` in signed
    /// arithmetic, so code -1 produces `0xFF 0xE0`. Codes above 7 want
    /// the low byte halved; that is firmware behavior, not a bug.
    pub fn payload(self) -> [u8; 2] {
        match self {
            Selector::Phono => [0x3F, 0x80],
            Selector::Standard(code) => {
                let out = 0x4000i32 | ((code as i32) << 5);
                let high = ((out >> 8) & 0xFF) as u8;
                let mut low = (out & 0xFF) as u8;
                if code > 7 {
                    low >>= 1;
                }
                [high, low]
            }
        }
    }
}
