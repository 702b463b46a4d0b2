// libuhf-rs/libuhf/src/protocol/responses/mod.rs

pub mod antenna;
pub mod config;
pub mod flash;
pub mod search;
pub mod system;

pub use search::{EmbeddedCounts, SearchSummary, TagBufferChunk};

use crate::protocol::commands::Command;
use crate::protocol::settings::{ConfigValue, ProtocolConfig};
use crate::types::{GpioPin, PowerMode, Region, TagProtocol, VersionInfo};
use crate::Result;

/// High-level Response enum. Per-family decoders live in
/// `protocol::responses::<family>.rs` and are dispatched here.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Setters and other commands whose reply carries nothing of interest.
    Ack,
    Version(VersionInfo),
    Region(Region),
    Protocol(TagProtocol),
    Protocols(Vec<TagProtocol>),
    AntennaPort { tx: u8, rx: u8 },
    DetectedAntennas(Vec<(u8, bool)>),
    Power(i16),
    PowerMode(PowerMode),
    ReaderConfig(ConfigValue),
    ProtocolConfig(ProtocolConfig),
    HopTable(Vec<u32>),
    HopTime(u32),
    Temperature(i8),
    GpioInputs(Vec<GpioPin>),
    FlashData(Vec<u8>),
    Search(SearchSummary),
    TagBuffer(TagBufferChunk),
    TagOpData(Vec<u8>),
}

impl Response {
    /// Decode the data bytes (status word already stripped) of the reply to
    /// `cmd`.
    pub fn decode(cmd: &Command, data: &[u8]) -> Result<Self> {
        Ok(match cmd {
            Command::Version => Self::Version(system::decode_version(data)?),
            Command::GetRegion => Self::Region(system::decode_region(data)?),
            Command::GetProtocol => Self::Protocol(system::decode_protocol(data)?),
            Command::GetAvailableProtocols => {
                Self::Protocols(system::decode_available_protocols(data)?)
            }
            Command::GetAntennaPort => {
                let (tx, rx) = antenna::decode_antenna_port(data)?;
                Self::AntennaPort { tx, rx }
            }
            Command::DetectAntennas => {
                Self::DetectedAntennas(antenna::decode_detected_antennas(data)?)
            }
            Command::GetReadPower | Command::GetWritePower => {
                Self::Power(antenna::decode_power(data)?)
            }
            Command::GetPowerMode => Self::PowerMode(system::decode_power_mode(data)?),
            Command::GetReaderConfig(key) => {
                Self::ReaderConfig(config::decode_reader_config(*key, data)?)
            }
            Command::GetProtocolConfig(param) => {
                Self::ProtocolConfig(config::decode_protocol_config(*param, data)?)
            }
            Command::GetHopTable => Self::HopTable(config::decode_hop_table(data)?),
            Command::GetHopTime => Self::HopTime(config::decode_hop_time(data)?),
            Command::GetTemperature => Self::Temperature(system::decode_temperature(data)?),
            Command::GetGpioInputs => Self::GpioInputs(config::decode_gpio_inputs(data)?),
            Command::ReadFlash { length, .. } => {
                Self::FlashData(flash::decode_read_flash(*length, data)?)
            }
            Command::Search(_) | Command::MultiProtocolSearch(_) => {
                Self::Search(search::decode_search(data)?)
            }
            Command::GetTagBuffer { .. } => Self::TagBuffer(search::decode_tag_buffer(data)?),
            Command::TagOp { .. } => Self::TagOpData(data.to_vec()),
            Command::SetBaudRate(_)
            | Command::SetRegion(_)
            | Command::SetProtocol(_)
            | Command::SetAntennaPort { .. }
            | Command::SetReadPower(_)
            | Command::SetWritePower(_)
            | Command::SetPowerMode(_)
            | Command::SetReaderConfig(..)
            | Command::SetProtocolConfig(_)
            | Command::SetHopTable(_)
            | Command::SetHopTime(_)
            | Command::SetGpioOutput { .. }
            | Command::SetGpioDirection { .. }
            | Command::EraseFlash { .. }
            | Command::WriteFlash { .. }
            | Command::StopStreaming
            | Command::AuthResponse { .. }
            | Command::ClearTagBuffer => Self::Ack,
        })
    }
}
