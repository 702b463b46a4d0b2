// libuhf-rs/libuhf/src/reader/models/m5e.rs

use crate::reader::models::DeviceModel;
use crate::tag::MetadataFlags;
use crate::types::ModelFamily;

/// M5e and M5e-Compact. Older firmware: no continuous search, no wakeup
/// preamble, RSSI as a raw magnitude.
#[derive(Debug)]
pub struct M5eModel {
    family: ModelFamily,
}

impl M5eModel {
    pub fn new(family: ModelFamily) -> Self {
        Self { family }
    }
}

impl DeviceModel for M5eModel {
    fn family(&self) -> ModelFamily {
        self.family
    }

    fn name(&self) -> &'static str {
        match self.family {
            ModelFamily::M5eCompact => "M5e Compact",
            _ => "M5e",
        }
    }

    fn supports_wakeup_preamble(&self) -> bool {
        false
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn physical_ports(&self) -> Vec<u8> {
        match self.family {
            ModelFamily::M5eCompact => vec![1],
            _ => vec![1, 2],
        }
    }

    fn read_power_range(&self) -> (i16, i16) {
        (500, 3000)
    }

    fn rssi_in_dbm(&self) -> bool {
        false
    }

    fn supported_metadata(&self) -> MetadataFlags {
        MetadataFlags::READ_COUNT
            | MetadataFlags::RSSI
            | MetadataFlags::ANTENNA
            | MetadataFlags::FREQUENCY
            | MetadataFlags::TIMESTAMP
            | MetadataFlags::PROTOCOL
            | MetadataFlags::DATA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_has_one_port() {
        assert_eq!(M5eModel::new(ModelFamily::M5eCompact).physical_ports(), vec![1]);
        assert_eq!(M5eModel::new(ModelFamily::M5e).physical_ports(), vec![1, 2]);
        assert!(!M5eModel::new(ModelFamily::M5e).supported_metadata().contains(MetadataFlags::PHASE));
    }
}
