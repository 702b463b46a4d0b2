// libuhf-rs/libuhf/src/protocol/commands/config.rs

use crate::constants::opcode;
use crate::protocol::settings::{ConfigValue, ProtocolConfig, ProtocolParam, ReaderConfigKey};
use crate::{Error, Result};

/// Option byte for the key/value reader configuration table.
pub const READER_CONFIG_OPT: u8 = 0x01;
/// Option byte selecting the hop-time variant of the hop table commands.
pub const HOP_TIME_OPT: u8 = 0x01;
/// Option byte selecting GPIO direction set / input list get.
pub const GPIO_DIRECTION_OPT: u8 = 0x01;

const MAX_HOP_ENTRIES: usize = 62;

pub fn encode_get_reader_config(key: ReaderConfigKey) -> Vec<u8> {
    vec![opcode::GET_READER_OPTIONAL_PARAMS, READER_CONFIG_OPT, key.code()]
}

pub fn encode_set_reader_config(key: ReaderConfigKey, value: ConfigValue) -> Result<Vec<u8>> {
    if value.width() != key.width() {
        return Err(Error::InvalidArgument(format!(
            "{:?} takes a {:?} value, got {:?}",
            key,
            key.width(),
            value
        )));
    }
    let mut out = vec![
        opcode::SET_READER_OPTIONAL_PARAMS,
        READER_CONFIG_OPT,
        key.code(),
    ];
    out.extend(value.encode());
    Ok(out)
}

pub fn encode_get_protocol_config(param: ProtocolParam) -> Vec<u8> {
    vec![
        opcode::GET_PROTOCOL_PARAM,
        param.protocol().code(),
        param.code(),
    ]
}

pub fn encode_set_protocol_config(config: &ProtocolConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let param = config.param();
    let mut out = vec![
        opcode::SET_PROTOCOL_PARAM,
        param.protocol().code(),
        param.code(),
    ];
    out.extend(config.encode_value());
    Ok(out)
}

pub fn encode_get_hop_table() -> Vec<u8> {
    vec![opcode::GET_FREQ_HOP_TABLE]
}

pub fn encode_set_hop_table(freqs_khz: &[u32]) -> Result<Vec<u8>> {
    if freqs_khz.is_empty() || freqs_khz.len() > MAX_HOP_ENTRIES {
        return Err(Error::InvalidArgument(format!(
            "hop table needs 1..={} entries, got {}",
            MAX_HOP_ENTRIES,
            freqs_khz.len()
        )));
    }
    let mut out = vec![opcode::SET_FREQ_HOP_TABLE];
    for f in freqs_khz {
        out.extend_from_slice(&f.to_be_bytes());
    }
    Ok(out)
}

pub fn encode_get_hop_time() -> Vec<u8> {
    vec![opcode::GET_FREQ_HOP_TABLE, HOP_TIME_OPT]
}

pub fn encode_set_hop_time(ms: u32) -> Vec<u8> {
    let mut out = vec![opcode::SET_FREQ_HOP_TABLE, HOP_TIME_OPT];
    out.extend_from_slice(&ms.to_be_bytes());
    out
}

pub fn encode_get_gpio_inputs() -> Vec<u8> {
    vec![opcode::GET_USER_GPIO_INPUTS, GPIO_DIRECTION_OPT]
}

pub fn encode_set_gpio_output(pin: u8, high: bool) -> Vec<u8> {
    vec![opcode::SET_USER_GPIO_OUTPUTS, pin, high as u8]
}

pub fn encode_set_gpio_direction(pin: u8, output: bool, high: bool) -> Vec<u8> {
    vec![
        opcode::SET_USER_GPIO_OUTPUTS,
        GPIO_DIRECTION_OPT,
        pin,
        output as u8,
        high as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::settings::{Gen2Session, WriteReplyTimeout};

    #[test]
    fn reader_config_width_checked() {
        assert_eq!(
            encode_set_reader_config(ReaderConfigKey::SendCrc, ConfigValue::Bool(false)).unwrap(),
            vec![0x9A, 0x01, 0x1B, 0x00]
        );
        assert!(
            encode_set_reader_config(ReaderConfigKey::SendCrc, ConfigValue::U32(0)).is_err()
        );
    }

    #[test]
    fn protocol_config_layout() {
        let args =
            encode_set_protocol_config(&ProtocolConfig::Gen2Session(Gen2Session::S2)).unwrap();
        assert_eq!(args, vec![0x9B, 0x05, 0x00, 0x02]);
    }

    #[test]
    fn invalid_protocol_config_never_encoded() {
        let cfg = ProtocolConfig::Gen2WriteReplyTimeout(WriteReplyTimeout {
            wait_us: 50_000,
            early_exit: true,
        });
        assert!(encode_set_protocol_config(&cfg).is_err());
    }

    #[test]
    fn hop_table_bounds() {
        assert!(encode_set_hop_table(&[]).is_err());
        assert_eq!(
            encode_set_hop_table(&[915_250]).unwrap(),
            vec![0x95, 0x00, 0x0D, 0xF7, 0x32]
        );
    }
}
