// libuhf-rs/libuhf/src/protocol/commands/mod.rs

pub mod antenna;
pub mod config;
pub mod flash;
pub mod search;
pub mod system;
pub mod tag;

pub use search::{
    MultiSearchRequest, ProtocolSearch, SearchRequest, StreamReports, search_flags,
};

use crate::constants::opcode;
use crate::protocol::filter::TagFilter;
use crate::protocol::settings::{ConfigValue, ProtocolConfig, ProtocolParam, ReaderConfigKey};
use crate::protocol::tagop::TagOp;
use crate::tag::MetadataFlags;
use crate::types::{PowerMode, Region, TagProtocol};
use crate::Result;

/// High-level Command enum. New commands should be added here and
/// their per-command encoder placed in `protocol::commands::<family>.rs`.
#[derive(Debug, Clone)]
pub enum Command {
    Version,
    SetBaudRate(u32),
    GetRegion,
    SetRegion(Region),
    GetProtocol,
    SetProtocol(TagProtocol),
    GetAvailableProtocols,
    GetAntennaPort,
    DetectAntennas,
    SetAntennaPort { tx: u8, rx: u8 },
    GetReadPower,
    SetReadPower(i16),
    GetWritePower,
    SetWritePower(i16),
    GetPowerMode,
    SetPowerMode(PowerMode),
    GetReaderConfig(ReaderConfigKey),
    SetReaderConfig(ReaderConfigKey, ConfigValue),
    GetProtocolConfig(ProtocolParam),
    SetProtocolConfig(ProtocolConfig),
    GetHopTable,
    SetHopTable(Vec<u32>),
    GetHopTime,
    SetHopTime(u32),
    GetTemperature,
    GetGpioInputs,
    SetGpioOutput { pin: u8, high: bool },
    SetGpioDirection { pin: u8, output: bool, high: bool },
    EraseFlash { password: u32, sector: u8 },
    WriteFlash {
        password: u32,
        address: u32,
        sector: u8,
        data: Vec<u8>,
    },
    ReadFlash { sector: u8, address: u32, length: u8 },
    Search(SearchRequest),
    MultiProtocolSearch(MultiSearchRequest),
    StopStreaming,
    AuthResponse { password: u32 },
    GetTagBuffer { metadata: MetadataFlags },
    ClearTagBuffer,
    TagOp {
        op: TagOp,
        timeout_ms: u16,
        password: u32,
        filter: Option<TagFilter>,
    },
}

impl Command {
    /// Opcode this command is sent with (and answered with).
    pub fn command_code(&self) -> u8 {
        match self {
            Self::Version => opcode::VERSION,
            Self::SetBaudRate(_) => opcode::SET_BAUD_RATE,
            Self::GetRegion => opcode::GET_REGION,
            Self::SetRegion(_) => opcode::SET_REGION,
            Self::GetProtocol => opcode::GET_TAG_PROTOCOL,
            Self::SetProtocol(_) => opcode::SET_TAG_PROTOCOL,
            Self::GetAvailableProtocols => opcode::GET_AVAILABLE_PROTOCOLS,
            Self::GetAntennaPort | Self::DetectAntennas => opcode::GET_ANTENNA_PORT,
            Self::SetAntennaPort { .. } => opcode::SET_ANTENNA_PORT,
            Self::GetReadPower => opcode::GET_READ_TX_POWER,
            Self::SetReadPower(_) => opcode::SET_READ_TX_POWER,
            Self::GetWritePower => opcode::GET_WRITE_TX_POWER,
            Self::SetWritePower(_) => opcode::SET_WRITE_TX_POWER,
            Self::GetPowerMode => opcode::GET_POWER_MODE,
            Self::SetPowerMode(_) => opcode::SET_POWER_MODE,
            Self::GetReaderConfig(_) => opcode::GET_READER_OPTIONAL_PARAMS,
            Self::SetReaderConfig(..) => opcode::SET_READER_OPTIONAL_PARAMS,
            Self::GetProtocolConfig(_) => opcode::GET_PROTOCOL_PARAM,
            Self::SetProtocolConfig(_) => opcode::SET_PROTOCOL_PARAM,
            Self::GetHopTable | Self::GetHopTime => opcode::GET_FREQ_HOP_TABLE,
            Self::SetHopTable(_) | Self::SetHopTime(_) => opcode::SET_FREQ_HOP_TABLE,
            Self::GetTemperature => opcode::GET_TEMPERATURE,
            Self::GetGpioInputs => opcode::GET_USER_GPIO_INPUTS,
            Self::SetGpioOutput { .. } | Self::SetGpioDirection { .. } => {
                opcode::SET_USER_GPIO_OUTPUTS
            }
            Self::EraseFlash { .. } => opcode::ERASE_FLASH,
            Self::WriteFlash { .. } => opcode::WRITE_FLASH,
            Self::ReadFlash { .. } => opcode::READ_FLASH,
            Self::Search(_) => opcode::READ_TAG_ID_MULTIPLE,
            Self::MultiProtocolSearch(_) | Self::StopStreaming | Self::AuthResponse { .. } => {
                opcode::MULTI_PROTOCOL_TAG_OP
            }
            Self::GetTagBuffer { .. } => opcode::GET_TAG_ID_BUFFER,
            Self::ClearTagBuffer => opcode::CLEAR_TAG_ID_BUFFER,
            Self::TagOp { op, .. } => op.opcode(),
        }
    }

    /// Encode the command into opcode + args, validating arguments first.
    pub fn encode(&self) -> Result<Vec<u8>> {
        use self::config::*;
        Ok(match self {
            Self::Version => system::encode_version(),
            Self::SetBaudRate(b) => system::encode_set_baud_rate(*b),
            Self::GetRegion => system::encode_get_region(),
            Self::SetRegion(r) => system::encode_set_region(*r),
            Self::GetProtocol => system::encode_get_protocol(),
            Self::SetProtocol(p) => system::encode_set_protocol(*p),
            Self::GetAvailableProtocols => system::encode_get_available_protocols(),
            Self::GetAntennaPort => antenna::encode_get_antenna_port(),
            Self::DetectAntennas => antenna::encode_detect_antennas(),
            Self::SetAntennaPort { tx, rx } => antenna::encode_set_antenna_port(*tx, *rx),
            Self::GetReadPower => antenna::encode_get_power(opcode::GET_READ_TX_POWER),
            Self::SetReadPower(p) => antenna::encode_set_power(opcode::SET_READ_TX_POWER, *p),
            Self::GetWritePower => antenna::encode_get_power(opcode::GET_WRITE_TX_POWER),
            Self::SetWritePower(p) => antenna::encode_set_power(opcode::SET_WRITE_TX_POWER, *p),
            Self::GetPowerMode => system::encode_get_power_mode(),
            Self::SetPowerMode(m) => system::encode_set_power_mode(*m)?,
            Self::GetReaderConfig(k) => encode_get_reader_config(*k),
            Self::SetReaderConfig(k, v) => encode_set_reader_config(*k, *v)?,
            Self::GetProtocolConfig(p) => encode_get_protocol_config(*p),
            Self::SetProtocolConfig(c) => encode_set_protocol_config(c)?,
            Self::GetHopTable => encode_get_hop_table(),
            Self::SetHopTable(t) => encode_set_hop_table(t)?,
            Self::GetHopTime => encode_get_hop_time(),
            Self::SetHopTime(ms) => encode_set_hop_time(*ms),
            Self::GetTemperature => system::encode_get_temperature(),
            Self::GetGpioInputs => encode_get_gpio_inputs(),
            Self::SetGpioOutput { pin, high } => encode_set_gpio_output(*pin, *high),
            Self::SetGpioDirection { pin, output, high } => {
                encode_set_gpio_direction(*pin, *output, *high)
            }
            Self::EraseFlash { password, sector } => flash::encode_erase_flash(*password, *sector),
            Self::WriteFlash {
                password,
                address,
                sector,
                data,
            } => flash::encode_write_flash(*password, *address, *sector, data)?,
            Self::ReadFlash {
                sector,
                address,
                length,
            } => flash::encode_read_flash(*sector, *address, *length)?,
            Self::Search(req) => search::encode_search(req)?,
            Self::MultiProtocolSearch(req) => search::encode_multi_search(req)?,
            Self::StopStreaming => search::encode_stop_streaming(),
            Self::AuthResponse { password } => search::encode_auth_response(*password),
            Self::GetTagBuffer { metadata } => search::encode_get_tag_buffer(*metadata),
            Self::ClearTagBuffer => search::encode_clear_tag_buffer(),
            Self::TagOp {
                op,
                timeout_ms,
                password,
                filter,
            } => tag::encode_tag_op(op, *timeout_ms, *password, filter.as_ref())?,
        })
    }
}
