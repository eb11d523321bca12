//! Volume encoding and decoding
//!
//! The two directions of the protocol do not share a formula. Status
//! frames report volume as one raw byte with an affine mapping, while
//! volume commands carry a 16-bit value built by recursively peeling
//! 0.5 dB steps off the magnitude and accumulating a shifted bit weight
//! per step. The asymmetry is the device's own design; the pair are
//! inverses of the physical quantity, not of each other's arithmetic.

/// Sign bit set in the command encoding for negative dB values.
pub const SIGN_BIT: u16 = 0x8000;

/// Minimum volume the device reports, in dB.
pub const VOLUME_MIN_DB: f64 = -96.0;

/// Recommended maximum volume, in dB. The encoding accepts values above
/// this but the device is not meant to be driven there over the network.
pub const VOLUME_MAX_DB: f64 = 0.0;

/// Decode the raw status-frame volume byte into dB.
pub fn code_to_db(raw: u8) -> f64 {
    raw as f64 / 2.0 - 97.5
}

/// Encode a dB value into the device's 16-bit command representation.
///
/// The input is quantized to the nearest 0.5 dB before encoding; the
/// device cannot express anything finer and the recursion is only
/// defined on 0.5 dB multiples. For those multiples the result is
/// bit-identical to the recursive definition observed in captures:
/// `db_to_code(-20.0) == 0xC1A0`, `db_to_code(0.5) == 0x3F00`.
///
/// Negative values get [`SIGN_BIT`] set; zero and positive values leave
/// it clear. The caller is expected to clamp to
/// [[`VOLUME_MIN_DB`], [`VOLUME_MAX_DB`]] before encoding.
pub fn db_to_code(db: f64) -> u16 {
    let halves = (db.abs() * 2.0).round() as u32;
    let mut code = magnitude_code(halves);
    if db < 0.0 {
        code |= SIGN_BIT;
    }
    code
}

/// Magnitude recursion over half-dB steps.
///
/// Base cases: 0 dB encodes as 0, 0.5 dB as 0x3F00. Each further step
/// contributes `256 >> ceil(1 + log2(db))` and recurses on `db - 0.5`.
fn magnitude_code(halves: u32) -> u16 {
    match halves {
        0 => 0,
        1 => 0x3F00,
        _ => {
            let db = halves as f64 / 2.0;
            let shift = (1.0 + db.log2()).ceil() as u32;
            let weight = 256u32.checked_shr(shift).unwrap_or(0) as u16;
            weight + magnitude_code(halves - 1)
        }
    }
}
