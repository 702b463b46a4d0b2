// libuhf-rs/libuhf/src/tag/record.rs

use std::time::{Duration, SystemTime};

use crate::types::{Epc, GpioPin, TagProtocol};

/// One tag observation.
///
/// `base_time` is stamped by the engine that fetched the record (the start
/// of the search), never by the parser.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagReadRecord {
    pub epc: Epc,
    /// `None` marks a record whose PC bits did not add up.
    pub crc: Option<u16>,
    /// PC word plus any extended-PC words, raw.
    pub pc: Vec<u8>,
    pub read_count: u32,
    pub rssi: i32,
    /// Logical antenna id.
    pub antenna: u32,
    pub frequency_khz: u32,
    pub timestamp_offset_ms: u32,
    pub phase: u16,
    pub protocol: TagProtocol,
    pub gpio: Vec<GpioPin>,
    pub data: Vec<u8>,
    pub base_time: Option<SystemTime>,
}

impl TagReadRecord {
    pub fn new(epc: Epc, protocol: TagProtocol) -> Self {
        Self {
            epc,
            crc: None,
            pc: Vec::new(),
            read_count: 1,
            rssi: 0,
            antenna: 0,
            frequency_khz: 0,
            timestamp_offset_ms: 0,
            phase: 0,
            protocol,
            gpio: Vec::new(),
            data: Vec::new(),
            base_time: None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        self.crc.is_none()
    }

    /// Absolute read time, when the fetching engine stamped a base time.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.base_time
            .map(|t| t + Duration::from_millis(self.timestamp_offset_ms as u64))
    }

    pub fn epc_hex(&self) -> String {
        self.epc.to_hex()
    }
}
