// libuhf-rs/libuhf/src/protocol/settings.rs
//! Key/value configuration understood by the reader: the generic
//! "reader configuration" table and per-protocol air parameters.

use crate::protocol::parser::{be_u16_at, be_u32_at, byte_at};
use crate::types::TagProtocol;
use crate::{Error, Result};

/// Encoded width of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    Bool,
    U8,
    U16,
    U32,
}

/// Generic reader configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderConfigKey {
    UniqueByAntenna,
    TransmitPowerSave,
    ExtendedEpc,
    SafetyAntennaCheck,
    SafetyTemperatureCheck,
    RecordHighestRssi,
    UniqueByData,
    RssiInDbm,
    UniqueByProtocol,
    EnableFiltering,
    TagBufferEntryTimeout,
    ProductGroupId,
    ProductId,
    SendCrc,
}

impl ReaderConfigKey {
    pub const fn code(self) -> u8 {
        match self {
            Self::UniqueByAntenna => 0x00,
            Self::TransmitPowerSave => 0x01,
            Self::ExtendedEpc => 0x02,
            Self::SafetyAntennaCheck => 0x04,
            Self::SafetyTemperatureCheck => 0x05,
            Self::RecordHighestRssi => 0x06,
            Self::UniqueByData => 0x08,
            Self::RssiInDbm => 0x09,
            Self::UniqueByProtocol => 0x0B,
            Self::EnableFiltering => 0x0C,
            Self::TagBufferEntryTimeout => 0x0D,
            Self::ProductGroupId => 0x12,
            Self::ProductId => 0x13,
            Self::SendCrc => 0x1B,
        }
    }

    pub const fn width(self) -> ValueWidth {
        match self {
            Self::TagBufferEntryTimeout => ValueWidth::U32,
            Self::ProductGroupId | Self::ProductId => ValueWidth::U16,
            _ => ValueWidth::Bool,
        }
    }
}

/// A configuration value in one of the wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
}

impl ConfigValue {
    pub fn width(&self) -> ValueWidth {
        match self {
            Self::Bool(_) => ValueWidth::Bool,
            Self::U8(_) => ValueWidth::U8,
            Self::U16(_) => ValueWidth::U16,
            Self::U32(_) => ValueWidth::U32,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Self::Bool(b) => vec![b as u8],
            Self::U8(v) => vec![v],
            Self::U16(v) => v.to_be_bytes().to_vec(),
            Self::U32(v) => v.to_be_bytes().to_vec(),
        }
    }

    pub fn decode(width: ValueWidth, data: &[u8]) -> Result<Self> {
        Ok(match width {
            ValueWidth::Bool => Self::Bool(byte_at(data, 0)? != 0),
            ValueWidth::U8 => Self::U8(byte_at(data, 0)?),
            ValueWidth::U16 => Self::U16(be_u16_at(data, 0)?),
            ValueWidth::U32 => Self::U32(be_u32_at(data, 0)?),
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::Bool(b) => Some(b as u32),
            Self::U8(v) => Some(v as u32),
            Self::U16(v) => Some(v as u32),
            Self::U32(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Session {
    S0 = 0,
    S1 = 1,
    S2 = 2,
    S3 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Target {
    A = 0,
    B = 1,
    AB = 2,
    BA = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2TagEncoding {
    Fm0 = 0,
    M2 = 1,
    M4 = 2,
    M8 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2LinkFrequency {
    Khz250 = 0,
    Khz640 = 4,
    Khz320 = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Tari {
    Us25 = 0,
    Us12_5 = 1,
    Us6_25 = 2,
}

/// Q algorithm: dynamic, or a static initial Q in 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Q {
    Dynamic,
    Static(u8),
}

/// Gen2 backscatter timing (microseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gen2Bap {
    pub power_up_delay_us: u32,
    pub freq_hop_off_time_us: u32,
}

/// Write-response wait time; fixed or early-exit on first reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriteReplyTimeout {
    pub wait_us: u16,
    pub early_exit: bool,
}

impl WriteReplyTimeout {
    pub const MIN_US: u16 = 1000;
    pub const MAX_US: u16 = 21000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Iso6bLinkFrequency {
    Khz40 = 0,
    Khz160 = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Iso6bModulationDepth {
    Percent99 = 0,
    Percent11 = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Iso6bDelimiter {
    Delimiter1 = 1,
    Delimiter4 = 4,
}

/// Parameter selector used for protocol-configuration get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolParam {
    Gen2Session,
    Gen2Target,
    Gen2TagEncoding,
    Gen2LinkFrequency,
    Gen2Tari,
    Gen2Q,
    Gen2Bap,
    Gen2WriteReplyTimeout,
    Iso6bLinkFrequency,
    Iso6bModulationDepth,
    Iso6bDelimiter,
}

impl ProtocolParam {
    pub fn protocol(self) -> TagProtocol {
        match self {
            Self::Iso6bLinkFrequency | Self::Iso6bModulationDepth | Self::Iso6bDelimiter => {
                TagProtocol::Iso180006b
            }
            _ => TagProtocol::Gen2,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Gen2Session => 0x00,
            Self::Gen2Target => 0x01,
            Self::Gen2TagEncoding => 0x02,
            Self::Gen2LinkFrequency => 0x10,
            Self::Gen2Tari => 0x11,
            Self::Gen2Q => 0x12,
            Self::Gen2Bap => 0x13,
            Self::Gen2WriteReplyTimeout => 0x3F,
            Self::Iso6bLinkFrequency => 0x10,
            Self::Iso6bModulationDepth => 0x11,
            Self::Iso6bDelimiter => 0x12,
        }
    }
}

/// A typed protocol configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolConfig {
    Gen2Session(Gen2Session),
    Gen2Target(Gen2Target),
    Gen2TagEncoding(Gen2TagEncoding),
    Gen2LinkFrequency(Gen2LinkFrequency),
    Gen2Tari(Gen2Tari),
    Gen2Q(Gen2Q),
    Gen2Bap(Gen2Bap),
    Gen2WriteReplyTimeout(WriteReplyTimeout),
    Iso6bLinkFrequency(Iso6bLinkFrequency),
    Iso6bModulationDepth(Iso6bModulationDepth),
    Iso6bDelimiter(Iso6bDelimiter),
}

impl ProtocolConfig {
    pub fn param(&self) -> ProtocolParam {
        match self {
            Self::Gen2Session(_) => ProtocolParam::Gen2Session,
            Self::Gen2Target(_) => ProtocolParam::Gen2Target,
            Self::Gen2TagEncoding(_) => ProtocolParam::Gen2TagEncoding,
            Self::Gen2LinkFrequency(_) => ProtocolParam::Gen2LinkFrequency,
            Self::Gen2Tari(_) => ProtocolParam::Gen2Tari,
            Self::Gen2Q(_) => ProtocolParam::Gen2Q,
            Self::Gen2Bap(_) => ProtocolParam::Gen2Bap,
            Self::Gen2WriteReplyTimeout(_) => ProtocolParam::Gen2WriteReplyTimeout,
            Self::Iso6bLinkFrequency(_) => ProtocolParam::Iso6bLinkFrequency,
            Self::Iso6bModulationDepth(_) => ProtocolParam::Iso6bModulationDepth,
            Self::Iso6bDelimiter(_) => ProtocolParam::Iso6bDelimiter,
        }
    }

    /// Range checks performed before anything is sent.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Gen2Q(Gen2Q::Static(q)) if q > 15 => Err(Error::InvalidArgument(format!(
                "static Q must be 0..=15, got {}",
                q
            ))),
            Self::Gen2WriteReplyTimeout(t)
                if !(WriteReplyTimeout::MIN_US..=WriteReplyTimeout::MAX_US)
                    .contains(&t.wait_us) =>
            {
                Err(Error::InvalidArgument(format!(
                    "write reply timeout must be {}..={} us, got {}",
                    WriteReplyTimeout::MIN_US,
                    WriteReplyTimeout::MAX_US,
                    t.wait_us
                )))
            }
            _ => Ok(()),
        }
    }

    /// Value bytes following `[protocol][param]`.
    pub fn encode_value(&self) -> Vec<u8> {
        match *self {
            Self::Gen2Session(v) => vec![v as u8],
            Self::Gen2Target(v) => match v {
                Gen2Target::A => vec![0x01, 0x00],
                Gen2Target::B => vec![0x01, 0x01],
                Gen2Target::AB => vec![0x00, 0x00],
                Gen2Target::BA => vec![0x00, 0x01],
            },
            Self::Gen2TagEncoding(v) => vec![v as u8],
            Self::Gen2LinkFrequency(v) => vec![v as u8],
            Self::Gen2Tari(v) => vec![v as u8],
            Self::Gen2Q(Gen2Q::Dynamic) => vec![0x00],
            Self::Gen2Q(Gen2Q::Static(q)) => vec![0x01, q],
            Self::Gen2Bap(b) => {
                let mut out = vec![0x01];
                out.extend_from_slice(&b.power_up_delay_us.to_be_bytes());
                out.extend_from_slice(&b.freq_hop_off_time_us.to_be_bytes());
                out
            }
            Self::Gen2WriteReplyTimeout(t) => {
                let mut out = vec![if t.early_exit { 0x00 } else { 0x01 }];
                out.extend_from_slice(&t.wait_us.to_be_bytes());
                out
            }
            Self::Iso6bLinkFrequency(v) => vec![v as u8],
            Self::Iso6bModulationDepth(v) => vec![v as u8],
            Self::Iso6bDelimiter(v) => vec![v as u8],
        }
    }

    /// Decode the value bytes of a protocol-configuration response.
    pub fn decode(param: ProtocolParam, data: &[u8]) -> Result<Self> {
        let bad = |what: &str, v: u8| Error::Parse(format!("unknown {} value {:#04x}", what, v));
        let b0 = byte_at(data, 0)?;
        Ok(match param {
            ProtocolParam::Gen2Session => Self::Gen2Session(match b0 {
                0 => Gen2Session::S0,
                1 => Gen2Session::S1,
                2 => Gen2Session::S2,
                3 => Gen2Session::S3,
                v => return Err(bad("session", v)),
            }),
            ProtocolParam::Gen2Target => {
                let b1 = byte_at(data, 1)?;
                Self::Gen2Target(match (b0, b1) {
                    (0x01, 0x00) => Gen2Target::A,
                    (0x01, 0x01) => Gen2Target::B,
                    (0x00, 0x00) => Gen2Target::AB,
                    (0x00, 0x01) => Gen2Target::BA,
                    (_, v) => return Err(bad("target", v)),
                })
            }
            ProtocolParam::Gen2TagEncoding => Self::Gen2TagEncoding(match b0 {
                0 => Gen2TagEncoding::Fm0,
                1 => Gen2TagEncoding::M2,
                2 => Gen2TagEncoding::M4,
                3 => Gen2TagEncoding::M8,
                v => return Err(bad("tag encoding", v)),
            }),
            ProtocolParam::Gen2LinkFrequency => Self::Gen2LinkFrequency(match b0 {
                0 => Gen2LinkFrequency::Khz250,
                2 => Gen2LinkFrequency::Khz320,
                4 => Gen2LinkFrequency::Khz640,
                v => return Err(bad("link frequency", v)),
            }),
            ProtocolParam::Gen2Tari => Self::Gen2Tari(match b0 {
                0 => Gen2Tari::Us25,
                1 => Gen2Tari::Us12_5,
                2 => Gen2Tari::Us6_25,
                v => return Err(bad("tari", v)),
            }),
            ProtocolParam::Gen2Q => match b0 {
                0 => Self::Gen2Q(Gen2Q::Dynamic),
                1 => Self::Gen2Q(Gen2Q::Static(byte_at(data, 1)?)),
                v => return Err(bad("q algorithm", v)),
            },
            ProtocolParam::Gen2Bap => Self::Gen2Bap(Gen2Bap {
                power_up_delay_us: be_u32_at(data, 1)?,
                freq_hop_off_time_us: be_u32_at(data, 5)?,
            }),
            ProtocolParam::Gen2WriteReplyTimeout => {
                Self::Gen2WriteReplyTimeout(WriteReplyTimeout {
                    early_exit: b0 == 0,
                    wait_us: be_u16_at(data, 1)?,
                })
            }
            ProtocolParam::Iso6bLinkFrequency => Self::Iso6bLinkFrequency(match b0 {
                0 => Iso6bLinkFrequency::Khz40,
                1 => Iso6bLinkFrequency::Khz160,
                v => return Err(bad("iso6b link frequency", v)),
            }),
            ProtocolParam::Iso6bModulationDepth => Self::Iso6bModulationDepth(match b0 {
                0 => Iso6bModulationDepth::Percent99,
                1 => Iso6bModulationDepth::Percent11,
                v => return Err(bad("modulation depth", v)),
            }),
            ProtocolParam::Iso6bDelimiter => Self::Iso6bDelimiter(match b0 {
                1 => Iso6bDelimiter::Delimiter1,
                4 => Iso6bDelimiter::Delimiter4,
                v => return Err(bad("delimiter", v)),
            }),
        })
    }
}
