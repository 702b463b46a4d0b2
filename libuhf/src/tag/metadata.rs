// libuhf-rs/libuhf/src/tag/metadata.rs

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::{Error, Result};

/// Metadata fields requested with each tag record. Fields are laid out on
/// the wire in ascending bit order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetadataFlags(u16);

impl MetadataFlags {
    pub const NONE: Self = Self(0x0000);
    pub const READ_COUNT: Self = Self(0x0001);
    pub const RSSI: Self = Self(0x0002);
    pub const ANTENNA: Self = Self(0x0004);
    pub const FREQUENCY: Self = Self(0x0008);
    pub const TIMESTAMP: Self = Self(0x0010);
    pub const PHASE: Self = Self(0x0020);
    pub const PROTOCOL: Self = Self(0x0040);
    pub const DATA: Self = Self(0x0080);
    pub const GPIO: Self = Self(0x0100);
    pub const ALL: Self = Self(0x01FF);

    /// Accepts only bits this parser knows how to consume.
    pub fn from_bits(bits: u16) -> Result<Self> {
        if bits & !Self::ALL.0 != 0 {
            return Err(Error::Parse(format!(
                "unsupported metadata bits {:#06x}",
                bits & !Self::ALL.0
            )));
        }
        Ok(Self(bits))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MetadataFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MetadataFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for MetadataFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataFlags({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_rejected() {
        assert!(MetadataFlags::from_bits(0x01FF).is_ok());
        assert!(matches!(
            MetadataFlags::from_bits(0x0200),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn combine() {
        let m = MetadataFlags::RSSI | MetadataFlags::ANTENNA;
        assert_eq!(m.bits(), 0x0006);
        assert!(m.contains(MetadataFlags::RSSI));
        assert!(!m.contains(MetadataFlags::PHASE));
    }
}
