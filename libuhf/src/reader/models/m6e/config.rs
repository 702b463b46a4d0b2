//! M6e-specific configuration

use crate::antenna::AntennaPort;

pub const PHYSICAL_PORTS: &[u8] = &[1, 2, 3, 4];

pub const MIN_POWER_CDBM: i16 = 500;
pub const MAX_POWER_CDBM: i16 = 3150;

/// Ruggedized enclosures wire the two external connectors crosswise.
pub const RUGGEDIZED_MAP: &[AntennaPort] = &[AntennaPort::new(1, 2, 2), AntennaPort::new(2, 1, 1)];
