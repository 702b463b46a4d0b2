// libuhf-rs/libuhf/src/protocol/commands/system.rs

use crate::constants::opcode;
use crate::types::{PowerMode, Region, TagProtocol};
use crate::Result;

pub fn encode_version() -> Vec<u8> {
    vec![opcode::VERSION]
}

pub fn encode_set_baud_rate(baud: u32) -> Vec<u8> {
    let mut out = vec![opcode::SET_BAUD_RATE];
    out.extend_from_slice(&baud.to_be_bytes());
    out
}

pub fn encode_get_region() -> Vec<u8> {
    vec![opcode::GET_REGION]
}

pub fn encode_set_region(region: Region) -> Vec<u8> {
    vec![opcode::SET_REGION, region.code()]
}

pub fn encode_get_protocol() -> Vec<u8> {
    vec![opcode::GET_TAG_PROTOCOL]
}

pub fn encode_set_protocol(protocol: TagProtocol) -> Vec<u8> {
    let mut out = vec![opcode::SET_TAG_PROTOCOL];
    out.extend_from_slice(&(protocol.code() as u16).to_be_bytes());
    out
}

pub fn encode_get_available_protocols() -> Vec<u8> {
    vec![opcode::GET_AVAILABLE_PROTOCOLS]
}

pub fn encode_get_power_mode() -> Vec<u8> {
    vec![opcode::GET_POWER_MODE]
}

pub fn encode_set_power_mode(mode: PowerMode) -> Result<Vec<u8>> {
    Ok(vec![opcode::SET_POWER_MODE, mode.code()?])
}

pub fn encode_get_temperature() -> Vec<u8> {
    vec![opcode::GET_TEMPERATURE]
}
