// libuhf-rs/libuhf/src/reader/models/generic.rs

use crate::reader::models::DeviceModel;
use crate::tag::MetadataFlags;
use crate::types::ModelFamily;

/// Hardware this crate does not recognise: one port, no streaming, no
/// multi-protocol search.
#[derive(Debug)]
pub struct GenericModel {
    family: ModelFamily,
}

impl GenericModel {
    pub fn new(family: ModelFamily) -> Self {
        Self { family }
    }
}

impl DeviceModel for GenericModel {
    fn family(&self) -> ModelFamily {
        self.family
    }

    fn name(&self) -> &'static str {
        "Unknown"
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn supports_multi_protocol_search(&self) -> bool {
        false
    }

    fn physical_ports(&self) -> Vec<u8> {
        vec![1]
    }

    fn read_power_range(&self) -> (i16, i16) {
        (0, 3000)
    }

    fn supported_metadata(&self) -> MetadataFlags {
        MetadataFlags::READ_COUNT
            | MetadataFlags::RSSI
            | MetadataFlags::ANTENNA
            | MetadataFlags::FREQUENCY
            | MetadataFlags::TIMESTAMP
            | MetadataFlags::PROTOCOL
    }
}
