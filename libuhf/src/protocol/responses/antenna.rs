// libuhf-rs/libuhf/src/protocol/responses/antenna.rs

use crate::protocol::commands::antenna::ANTENNA_OPT_DETECT;
use crate::protocol::parser::{be_u16_at, byte_at, expect_byte};
use crate::{Error, Result};

pub fn decode_antenna_port(data: &[u8]) -> Result<(u8, u8)> {
    Ok((byte_at(data, 0)?, byte_at(data, 1)?))
}

/// `[opt][port][detected]...`
pub fn decode_detected_antennas(data: &[u8]) -> Result<Vec<(u8, bool)>> {
    expect_byte(data, 0, ANTENNA_OPT_DETECT)?;
    let body = &data[1..];
    if body.len() % 2 != 0 {
        return Err(Error::InvalidLength {
            expected: body.len() + 1,
            actual: body.len(),
        });
    }
    Ok(body.chunks(2).map(|c| (c[0], c[1] != 0)).collect())
}

pub fn decode_power(data: &[u8]) -> Result<i16> {
    Ok(be_u16_at(data, 0)? as i16)
}
