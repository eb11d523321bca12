//! CRC-16/CCITT-FALSE checksum engine
//!
//! Both directions of the protocol use the same checksum. Status frames
//! carry it over bytes 0..596 in a big-endian trailer at 596..598, and
//! command frames carry it over bytes 0..12 at offset 12. Initial
//! register 0xFFFF, polynomial 0x1021, no reflection, no final XOR.

/// Compute the CRC-16/CCITT-FALSE checksum of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Verify a frame whose last two bytes are its big-endian CRC trailer.
pub fn verify_trailer(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let body = frame.len() - 2;
    let stored = u16::from_be_bytes([frame[body], frame[body + 1]]);
    crc16(&frame[..body]) == stored
}
