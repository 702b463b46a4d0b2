// libuhf-rs/libuhf/src/read/events.rs

use std::convert::TryFrom;

use crate::antenna::AntennaMap;
use crate::protocol::parser::Cursor;
use crate::tag::TagReadRecord;
use crate::types::TagProtocol;
use crate::{Error, Result};

/// Field mask bits of a streamed status report.
pub mod status_fields {
    pub const FREQUENCY: u16 = 0x0001;
    pub const TEMPERATURE: u16 = 0x0002;
    pub const ANTENNA: u16 = 0x0004;
    pub const ALL: u16 = 0x0007;
}

/// Field mask bits of a streamed stats report.
pub mod stats_fields {
    pub const RF_ON_TIME: u16 = 0x0001;
    pub const NOISE_FLOOR: u16 = 0x0002;
    pub const FREQUENCY: u16 = 0x0004;
    pub const TEMPERATURE: u16 = 0x0008;
    pub const ANTENNA: u16 = 0x0010;
    pub const PROTOCOL: u16 = 0x0020;
    pub const CONNECTED_ANTENNAS: u16 = 0x0040;
    pub const ALL: u16 = 0x007F;
}

/// Everything a streaming session delivers, in device order.
#[derive(Debug)]
pub enum ReadEvent {
    Tag(TagReadRecord),
    Status(StatusReport),
    Stats(ReaderStats),
    /// A fault observed by the background loop. The loop decides on its own
    /// whether to keep going.
    Exception(Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusReport {
    pub frequency_khz: Option<u32>,
    pub temperature_c: Option<i8>,
    pub antenna: Option<u32>,
}

impl StatusReport {
    /// `[fields u16][frequency u24][temperature i8][antenna wire byte]`,
    /// each field present only when its bit is set.
    pub fn parse(data: &[u8], antennas: &AntennaMap) -> Result<Self> {
        let mut c = Cursor::new(data);
        let fields = c.u16()?;
        let mut report = StatusReport::default();
        if fields & status_fields::FREQUENCY != 0 {
            report.frequency_khz = Some(c.u24()?);
        }
        if fields & status_fields::TEMPERATURE != 0 {
            report.temperature_c = Some(c.i8()?);
        }
        if fields & status_fields::ANTENNA != 0 {
            report.antenna = Some(antennas.translate_wire(c.u8()?)?);
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderStats {
    /// Milliseconds of RF on time since the previous report.
    pub rf_on_time_ms: Option<u32>,
    /// `(logical antenna, noise floor dBm)`
    pub noise_floor: Vec<(u32, i8)>,
    pub frequency_khz: Option<u32>,
    pub temperature_c: Option<i8>,
    pub antenna: Option<u32>,
    pub protocol: Option<TagProtocol>,
    /// `(logical antenna, connected)`
    pub connected_antennas: Vec<(u32, bool)>,
}

impl ReaderStats {
    pub fn parse(data: &[u8], antennas: &AntennaMap) -> Result<Self> {
        let mut c = Cursor::new(data);
        let fields = c.u16()?;
        let mut stats = ReaderStats::default();
        if fields & stats_fields::RF_ON_TIME != 0 {
            stats.rf_on_time_ms = Some(c.u32()?);
        }
        if fields & stats_fields::NOISE_FLOOR != 0 {
            let n = c.u8()?;
            for _ in 0..n {
                let ant = antennas.translate_wire(c.u8()?)?;
                stats.noise_floor.push((ant, c.i8()?));
            }
        }
        if fields & stats_fields::FREQUENCY != 0 {
            stats.frequency_khz = Some(c.u24()?);
        }
        if fields & stats_fields::TEMPERATURE != 0 {
            stats.temperature_c = Some(c.i8()?);
        }
        if fields & stats_fields::ANTENNA != 0 {
            stats.antenna = Some(antennas.translate_wire(c.u8()?)?);
        }
        if fields & stats_fields::PROTOCOL != 0 {
            stats.protocol = Some(TagProtocol::try_from(c.u8()?)?);
        }
        if fields & stats_fields::CONNECTED_ANTENNAS != 0 {
            let n = c.u8()?;
            for _ in 0..n {
                let ant = antennas.translate_wire(c.u8()?)?;
                stats.connected_antennas.push((ant, c.u8()? != 0));
            }
        }
        Ok(stats)
    }
}
