// libuhf-rs/libuhf/src/protocol/responses/flash.rs

use crate::{Error, Result};

pub fn decode_read_flash(expected_len: u8, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() != expected_len as usize {
        return Err(Error::InvalidLength {
            expected: expected_len as usize,
            actual: data.len(),
        });
    }
    Ok(data.to_vec())
}
