// libuhf-rs/libuhf/src/types.rs

use std::convert::TryFrom;

use derive_more::Display;

use crate::protocol::parser::{byte_at, slice_at};
use crate::{Error, Result};

/// Air protocol of a tag / search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagProtocol {
    #[display(fmt = "NONE")]
    None,
    #[display(fmt = "ISO180006B")]
    Iso180006b,
    #[display(fmt = "GEN2")]
    Gen2,
    #[display(fmt = "ISO180006B_UCODE")]
    Iso180006bUcode,
    #[display(fmt = "IPX64")]
    Ipx64,
    #[display(fmt = "IPX256")]
    Ipx256,
    #[display(fmt = "ATA")]
    Ata,
}

impl TagProtocol {
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Iso180006b => 0x03,
            Self::Gen2 => 0x05,
            Self::Iso180006bUcode => 0x06,
            Self::Ipx64 => 0x07,
            Self::Ipx256 => 0x08,
            Self::Ata => 0x1D,
        }
    }

    /// Gen2 tags prefix the EPC with a PC word.
    pub fn has_pc_word(self) -> bool {
        self == Self::Gen2
    }

    /// Only Gen2 searches can carry an embedded tag operation.
    pub fn supports_embedded_ops(self) -> bool {
        self == Self::Gen2
    }
}

impl TryFrom<u8> for TagProtocol {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0x00 => Self::None,
            0x03 => Self::Iso180006b,
            0x05 => Self::Gen2,
            0x06 => Self::Iso180006bUcode,
            0x07 => Self::Ipx64,
            0x08 => Self::Ipx256,
            0x1D => Self::Ata,
            other => return Err(Error::Parse(format!("unknown tag protocol {:#04x}", other))),
        })
    }
}

/// Regulatory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    #[display(fmt = "UNSPEC")]
    Unspecified,
    #[display(fmt = "NA")]
    NorthAmerica,
    #[display(fmt = "EU")]
    Europe,
    #[display(fmt = "KR")]
    Korea,
    #[display(fmt = "IN")]
    India,
    #[display(fmt = "JP")]
    Japan,
    #[display(fmt = "PRC")]
    China,
    #[display(fmt = "EU2")]
    Europe2,
    #[display(fmt = "EU3")]
    Europe3,
    #[display(fmt = "AU")]
    Australia,
    #[display(fmt = "NZ")]
    NewZealand,
    #[display(fmt = "OPEN")]
    Open,
}

impl Region {
    pub const fn code(self) -> u8 {
        match self {
            Self::Unspecified => 0x00,
            Self::NorthAmerica => 0x01,
            Self::Europe => 0x02,
            Self::Korea => 0x03,
            Self::India => 0x04,
            Self::Japan => 0x05,
            Self::China => 0x06,
            Self::Europe2 => 0x07,
            Self::Europe3 => 0x08,
            Self::Australia => 0x0B,
            Self::NewZealand => 0x0C,
            Self::Open => 0xFF,
        }
    }
}

impl TryFrom<u8> for Region {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0x00 => Self::Unspecified,
            0x01 => Self::NorthAmerica,
            0x02 => Self::Europe,
            0x03 => Self::Korea,
            0x04 => Self::India,
            0x05 => Self::Japan,
            0x06 => Self::China,
            0x07 => Self::Europe2,
            0x08 => Self::Europe3,
            0x0B => Self::Australia,
            0x0C => Self::NewZealand,
            0xFF => Self::Open,
            other => return Err(Error::Parse(format!("unknown region {:#04x}", other))),
        })
    }
}

/// Module power mode. `Unknown` is the cache state before the first query
/// and after a detected reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerMode {
    #[display(fmt = "FULL")]
    Full,
    #[display(fmt = "MINSAVE")]
    MinSave,
    #[display(fmt = "MEDSAVE")]
    MedSave,
    #[display(fmt = "MAXSAVE")]
    MaxSave,
    #[display(fmt = "SLEEP")]
    Sleep,
    #[default]
    #[display(fmt = "UNKNOWN")]
    Unknown,
}

impl PowerMode {
    pub fn code(self) -> Result<u8> {
        Ok(match self {
            Self::Full => 0,
            Self::MinSave => 1,
            Self::MedSave => 2,
            Self::MaxSave => 3,
            Self::Sleep => 4,
            Self::Unknown => {
                return Err(Error::InvalidArgument(
                    "power mode UNKNOWN cannot be set".into(),
                ));
            }
        })
    }

    /// Whether frames must be preceded by a wakeup preamble in this state.
    pub fn needs_wakeup(self) -> bool {
        matches!(self, Self::Sleep | Self::Unknown)
    }
}

impl TryFrom<u8> for PowerMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Self::Full,
            1 => Self::MinSave,
            2 => Self::MedSave,
            3 => Self::MaxSave,
            4 => Self::Sleep,
            other => return Err(Error::Parse(format!("unknown power mode {}", other))),
        })
    }
}

/// Hardware family, from the first hardware-version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelFamily {
    #[display(fmt = "M5e")]
    M5e,
    #[display(fmt = "M5e Compact")]
    M5eCompact,
    #[display(fmt = "M6e")]
    M6e,
    #[display(fmt = "M6e Micro")]
    M6eMicro,
    #[display(fmt = "M6e Nano")]
    M6eNano,
    #[display(fmt = "Unknown({:#04x})", _0)]
    Unknown(u8),
}

impl From<u8> for ModelFamily {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::M5e,
            0x01 => Self::M5eCompact,
            0x18 => Self::M6e,
            0x20 => Self::M6eMicro,
            0x30 => Self::M6eNano,
            other => Self::Unknown(other),
        }
    }
}

/// Enclosure category reported by the reader configuration; drives the
/// default antenna remap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductGroup {
    #[default]
    Module,
    RuggedizedReader,
    UsbReader,
}

impl From<u16> for ProductGroup {
    fn from(id: u16) -> Self {
        match id {
            1 => Self::RuggedizedReader,
            2 => Self::UsbReader,
            _ => Self::Module,
        }
    }
}

/// Decoded version response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionInfo {
    pub bootloader: [u8; 4],
    pub hardware: [u8; 4],
    pub firmware_date: [u8; 4],
    pub firmware_version: [u8; 4],
    /// Bit `n - 1` set when protocol code `n` is supported.
    pub protocols: u32,
}

impl VersionInfo {
    pub const WIRE_LEN: usize = 20;

    pub fn model(&self) -> ModelFamily {
        ModelFamily::from(self.hardware[0])
    }

    pub fn supported_protocols(&self) -> Vec<TagProtocol> {
        (1u8..=32)
            .filter(|code| self.protocols & (1 << (code - 1)) != 0)
            .filter_map(|code| TagProtocol::try_from(code).ok())
            .collect()
    }

    pub fn firmware_string(&self) -> String {
        let v = self.firmware_version;
        format!("{:02x}.{:02x}.{:02x}.{:02x}", v[0], v[1], v[2], v[3])
    }
}

impl TryFrom<&[u8]> for VersionInfo {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        let quad = |idx: usize| -> Result<[u8; 4]> {
            let s = slice_at(data, idx, 4)?;
            Ok([s[0], s[1], s[2], s[3]])
        };
        Ok(Self {
            bootloader: quad(0)?,
            hardware: quad(4)?,
            firmware_date: quad(8)?,
            firmware_version: quad(12)?,
            protocols: u32::from_be_bytes(quad(16)?),
        })
    }
}

/// EPC - Newtype Pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epc(Vec<u8>);

impl Epc {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        crate::utils::epc_to_hex(&self.0)
    }
}

impl std::fmt::Display for Epc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Gen2 memory bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryBank {
    Reserved = 0,
    Epc = 1,
    Tid = 2,
    User = 3,
}

impl MemoryBank {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MemoryBank {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Self::Reserved,
            1 => Self::Epc,
            2 => Self::Tid,
            3 => Self::User,
            other => return Err(Error::Parse(format!("unknown memory bank {}", other))),
        })
    }
}

/// State of one user GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpioPin {
    pub id: u8,
    pub high: bool,
    pub output: bool,
}

impl GpioPin {
    /// Decode `[id][output][high]` triples.
    pub fn parse_list(data: &[u8]) -> Result<Vec<GpioPin>> {
        if data.len() % 3 != 0 {
            return Err(Error::InvalidLength {
                expected: data.len() / 3 * 3 + 3,
                actual: data.len(),
            });
        }
        data.chunks(3)
            .map(|c| {
                Ok(GpioPin {
                    id: byte_at(c, 0)?,
                    output: byte_at(c, 1)? != 0,
                    high: byte_at(c, 2)? != 0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_codes() {
        for p in [
            TagProtocol::None,
            TagProtocol::Iso180006b,
            TagProtocol::Gen2,
            TagProtocol::Ata,
        ] {
            assert_eq!(TagProtocol::try_from(p.code()).unwrap(), p);
        }
        assert!(TagProtocol::try_from(0x42).is_err());
        assert_eq!(TagProtocol::Gen2.to_string(), "GEN2");
    }

    #[test]
    fn version_decodes_model_and_protocols() {
        let mut data = vec![0u8; 20];
        data[4] = 0x18; // hardware family
        data[12..16].copy_from_slice(&[0x01, 0x03, 0x00, 0x42]);
        // Gen2 (5) and ISO18000-6B (3)
        data[16..20].copy_from_slice(&(0b1_0100u32).to_be_bytes());
        let v = VersionInfo::try_from(&data[..]).unwrap();
        assert_eq!(v.model(), ModelFamily::M6e);
        assert_eq!(
            v.supported_protocols(),
            vec![TagProtocol::Iso180006b, TagProtocol::Gen2]
        );
        assert_eq!(v.firmware_string(), "01.03.00.42");
    }

    #[test]
    fn version_too_short() {
        assert!(matches!(
            VersionInfo::try_from(&[0u8; 10][..]),
            Err(Error::InvalidLength { .. })
        ));
    }

    #[test]
    fn power_mode_unknown_not_settable() {
        assert!(PowerMode::Unknown.code().is_err());
        assert!(PowerMode::Unknown.needs_wakeup());
        assert!(PowerMode::Sleep.needs_wakeup());
        assert!(!PowerMode::Full.needs_wakeup());
    }

    #[test]
    fn gpio_list() {
        let pins = GpioPin::parse_list(&[1, 0, 1, 2, 1, 0]).unwrap();
        assert_eq!(pins.len(), 2);
        assert!(pins[0].high && !pins[0].output);
        assert!(!pins[1].high && pins[1].output);
        assert!(GpioPin::parse_list(&[1, 0]).is_err());
    }

    #[test]
    fn epc_display_uppercase() {
        let epc = Epc::from_bytes(&[0xE2, 0x00, 0xab]);
        assert_eq!(epc.to_string(), "E200AB");
    }
}
