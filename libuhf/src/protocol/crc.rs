// libuhf-rs/libuhf/src/protocol/crc.rs

use crate::constants::{CRC_INIT, CRC_POLY};

/// CRC-CCITT (poly 0x1021, init 0xFFFF, no reflection, no final xor).
/// Computed over length + opcode + args, never over SOF or the CRC itself.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INIT, |crc, &b| update(crc, b))
}

fn update(mut crc: u16, byte: u8) -> u16 {
    crc ^= (byte as u16) << 8;
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ CRC_POLY
        } else {
            crc << 1
        };
    }
    crc
}
