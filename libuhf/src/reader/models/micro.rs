// libuhf-rs/libuhf/src/reader/models/micro.rs

use crate::reader::models::DeviceModel;
use crate::types::ModelFamily;

#[derive(Debug)]
pub struct MicroModel;

impl MicroModel {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceModel for MicroModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::M6eMicro
    }

    fn name(&self) -> &'static str {
        "M6e Micro"
    }

    fn supports_crc_disable(&self) -> bool {
        true
    }

    fn physical_ports(&self) -> Vec<u8> {
        vec![1, 2]
    }

    fn read_power_range(&self) -> (i16, i16) {
        (0, 3000)
    }
}
