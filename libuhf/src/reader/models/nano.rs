// libuhf-rs/libuhf/src/reader/models/nano.rs

use crate::reader::models::DeviceModel;
use crate::types::ModelFamily;

/// Single-port module whose write power tops out below its read power.
#[derive(Debug)]
pub struct NanoModel;

impl NanoModel {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceModel for NanoModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::M6eNano
    }

    fn name(&self) -> &'static str {
        "M6e Nano"
    }

    fn supports_multi_protocol_search(&self) -> bool {
        false
    }

    fn physical_ports(&self) -> Vec<u8> {
        vec![1]
    }

    fn read_power_range(&self) -> (i16, i16) {
        (0, 2700)
    }

    fn write_power_range(&self) -> (i16, i16) {
        (0, 2500)
    }
}
