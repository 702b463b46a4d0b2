// libuhf-rs/libuhf/src/protocol/responses/system.rs

use std::convert::TryFrom;

use log::debug;

use crate::protocol::parser::{be_u16_at, byte_at};
use crate::types::{PowerMode, Region, TagProtocol, VersionInfo};
use crate::{Error, Result};

pub fn decode_version(data: &[u8]) -> Result<VersionInfo> {
    VersionInfo::try_from(data)
}

pub fn decode_region(data: &[u8]) -> Result<Region> {
    Region::try_from(byte_at(data, 0)?)
}

pub fn decode_protocol(data: &[u8]) -> Result<TagProtocol> {
    let code = be_u16_at(data, 0)?;
    let code = u8::try_from(code)
        .map_err(|_| Error::Parse(format!("tag protocol {:#06x} out of range", code)))?;
    TagProtocol::try_from(code)
}

/// List of u16 protocol codes. Codes this crate does not model are skipped.
pub fn decode_available_protocols(data: &[u8]) -> Result<Vec<TagProtocol>> {
    if data.len() % 2 != 0 {
        return Err(Error::InvalidLength {
            expected: data.len() + 1,
            actual: data.len(),
        });
    }
    let mut out = Vec::with_capacity(data.len() / 2);
    for chunk in data.chunks(2) {
        match decode_protocol(chunk) {
            Ok(p) => out.push(p),
            Err(_) => debug!("skipping unmodelled protocol code {:02x?}", chunk),
        }
    }
    Ok(out)
}

pub fn decode_power_mode(data: &[u8]) -> Result<PowerMode> {
    PowerMode::try_from(byte_at(data, 0)?)
}

pub fn decode_temperature(data: &[u8]) -> Result<i8> {
    Ok(byte_at(data, 0)? as i8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_protocols_skip_unknown() {
        let data = [0x00, 0x05, 0x00, 0x03, 0x00, 0x42];
        assert_eq!(
            decode_available_protocols(&data).unwrap(),
            vec![TagProtocol::Gen2, TagProtocol::Iso180006b]
        );
        assert!(decode_available_protocols(&[0x00]).is_err());
    }

    #[test]
    fn negative_temperature() {
        assert_eq!(decode_temperature(&[0xF6]).unwrap(), -10);
    }

    #[test]
    fn protocol_u16() {
        assert_eq!(decode_protocol(&[0x00, 0x05]).unwrap(), TagProtocol::Gen2);
        assert!(decode_protocol(&[0x01, 0x05]).is_err());
    }
}
