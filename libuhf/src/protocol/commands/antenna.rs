// libuhf-rs/libuhf/src/protocol/commands/antenna.rs

use crate::constants::opcode;

/// Option byte selecting the current tx/rx pair.
pub const ANTENNA_OPT_CURRENT: u8 = 0x00;
/// Option byte selecting per-port detection results.
pub const ANTENNA_OPT_DETECT: u8 = 0x05;

pub fn encode_get_antenna_port() -> Vec<u8> {
    vec![opcode::GET_ANTENNA_PORT, ANTENNA_OPT_CURRENT]
}

pub fn encode_detect_antennas() -> Vec<u8> {
    vec![opcode::GET_ANTENNA_PORT, ANTENNA_OPT_DETECT]
}

pub fn encode_set_antenna_port(tx: u8, rx: u8) -> Vec<u8> {
    vec![opcode::SET_ANTENNA_PORT, tx, rx]
}

/// Read or write TX power getter; power values are centi-dBm.
pub fn encode_get_power(op: u8) -> Vec<u8> {
    vec![op]
}

pub fn encode_set_power(op: u8, centi_dbm: i16) -> Vec<u8> {
    let mut out = vec![op];
    out.extend_from_slice(&centi_dbm.to_be_bytes());
    out
}
