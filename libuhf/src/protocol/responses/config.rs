// libuhf-rs/libuhf/src/protocol/responses/config.rs

use crate::protocol::commands::config::{GPIO_DIRECTION_OPT, HOP_TIME_OPT, READER_CONFIG_OPT};
use crate::protocol::parser::{be_u32_at, expect_byte};
use crate::protocol::settings::{ConfigValue, ProtocolConfig, ProtocolParam, ReaderConfigKey};
use crate::types::GpioPin;
use crate::{Error, Result};

/// `[opt][key][value]`
pub fn decode_reader_config(key: ReaderConfigKey, data: &[u8]) -> Result<ConfigValue> {
    expect_byte(data, 0, READER_CONFIG_OPT)?;
    expect_byte(data, 1, key.code())?;
    ConfigValue::decode(key.width(), &data[2..])
}

/// `[protocol][param][value]`
pub fn decode_protocol_config(param: ProtocolParam, data: &[u8]) -> Result<ProtocolConfig> {
    expect_byte(data, 0, param.protocol().code())?;
    expect_byte(data, 1, param.code())?;
    ProtocolConfig::decode(param, &data[2..])
}

pub fn decode_hop_table(data: &[u8]) -> Result<Vec<u32>> {
    if data.len() % 4 != 0 {
        return Err(Error::InvalidLength {
            expected: data.len().next_multiple_of(4),
            actual: data.len(),
        });
    }
    (0..data.len() / 4).map(|i| be_u32_at(data, i * 4)).collect()
}

pub fn decode_hop_time(data: &[u8]) -> Result<u32> {
    expect_byte(data, 0, HOP_TIME_OPT)?;
    be_u32_at(data, 1)
}

pub fn decode_gpio_inputs(data: &[u8]) -> Result<Vec<GpioPin>> {
    expect_byte(data, 0, GPIO_DIRECTION_OPT)?;
    GpioPin::parse_list(&data[1..])
}
