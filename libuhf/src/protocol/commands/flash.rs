// libuhf-rs/libuhf/src/protocol/commands/flash.rs
//! Flash sector access used during firmware maintenance.

use crate::constants::opcode;
use crate::{Error, Result};

pub const MAX_FLASH_WRITE: usize = 240;
pub const MAX_FLASH_READ: u8 = 248;

pub fn encode_erase_flash(password: u32, sector: u8) -> Vec<u8> {
    let mut out = vec![opcode::ERASE_FLASH];
    out.extend_from_slice(&password.to_be_bytes());
    out.push(sector);
    out
}

pub fn encode_write_flash(password: u32, address: u32, sector: u8, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > MAX_FLASH_WRITE {
        return Err(Error::InvalidArgument(format!(
            "flash write takes 1..={} bytes, got {}",
            MAX_FLASH_WRITE,
            data.len()
        )));
    }
    let mut out = vec![opcode::WRITE_FLASH];
    out.extend_from_slice(&password.to_be_bytes());
    out.extend_from_slice(&address.to_be_bytes());
    out.push(sector);
    out.extend_from_slice(data);
    Ok(out)
}

pub fn encode_read_flash(sector: u8, address: u32, length: u8) -> Result<Vec<u8>> {
    if length == 0 || length > MAX_FLASH_READ {
        return Err(Error::InvalidArgument(format!(
            "flash read takes 1..={} bytes, got {}",
            MAX_FLASH_READ, length
        )));
    }
    let mut out = vec![opcode::READ_FLASH, sector];
    out.extend_from_slice(&address.to_be_bytes());
    out.push(length);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_layout() {
        assert_eq!(
            encode_erase_flash(0x7900_3912, 2),
            vec![0x07, 0x79, 0x00, 0x39, 0x12, 0x02]
        );
    }

    #[test]
    fn write_bounds() {
        assert!(encode_write_flash(0, 0, 0, &[]).is_err());
        assert!(encode_write_flash(0, 0, 0, &[0u8; 241]).is_err());
        let args = encode_write_flash(1, 0x10, 3, &[0xAA]).unwrap();
        assert_eq!(args, vec![0x01, 0, 0, 0, 1, 0, 0, 0, 0x10, 3, 0xAA]);
    }

    #[test]
    fn read_bounds() {
        assert!(encode_read_flash(0, 0, 0).is_err());
        assert!(encode_read_flash(0, 0, 249).is_err());
        assert_eq!(
            encode_read_flash(3, 0x100, 16).unwrap(),
            vec![0x02, 3, 0, 0, 1, 0, 16]
        );
    }
}
