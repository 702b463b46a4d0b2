// libuhf-rs/libuhf/src/reader/models/mod.rs

use std::fmt::Debug;
use std::sync::Arc;

use crate::antenna::AntennaMap;
use crate::tag::MetadataFlags;
use crate::types::{ModelFamily, ProductGroup};

/// Per-family capabilities and defaults the driver branches on.
pub trait DeviceModel: Send + Sync + Debug {
    fn family(&self) -> ModelFamily;

    /// Model string written back to the parameter store.
    fn name(&self) -> &'static str;

    /// Whether a sleeping module needs a run of 0xFF before each frame.
    fn supports_wakeup_preamble(&self) -> bool {
        true
    }

    /// Hardware continuous search (otherwise streaming is emulated).
    fn supports_streaming(&self) -> bool {
        true
    }

    fn supports_multi_protocol_search(&self) -> bool {
        true
    }

    /// Whether the CRC trailer can be switched off over USB.
    fn supports_crc_disable(&self) -> bool {
        false
    }

    fn physical_ports(&self) -> Vec<u8>;

    /// Read TX power range in centi-dBm.
    fn read_power_range(&self) -> (i16, i16);

    /// Write TX power range in centi-dBm; same as the read range unless a
    /// family says otherwise.
    fn write_power_range(&self) -> (i16, i16) {
        self.read_power_range()
    }

    /// RSSI reported as signed dBm rather than a raw magnitude.
    fn rssi_in_dbm(&self) -> bool {
        true
    }

    /// Metadata fields the firmware can attach to tag records.
    fn supported_metadata(&self) -> MetadataFlags {
        MetadataFlags::ALL
    }

    /// Default antenna map for a product group.
    fn antenna_map(&self, _group: ProductGroup) -> AntennaMap {
        AntennaMap::monostatic(&self.physical_ports())
    }
}

mod generic;
mod m5e;
mod m6e;
mod micro;
mod nano;

pub use generic::GenericModel;
pub use m5e::M5eModel;
pub use m6e::M6eModel;
pub use micro::MicroModel;
pub use nano::NanoModel;

/// Factory to create a model implementation for a hardware family. Unknown
/// hardware gets conservative generic capabilities.
pub fn create_model_for(family: ModelFamily) -> Arc<dyn DeviceModel> {
    match family {
        ModelFamily::M5e | ModelFamily::M5eCompact => Arc::new(M5eModel::new(family)),
        ModelFamily::M6e => Arc::new(M6eModel::new()),
        ModelFamily::M6eMicro => Arc::new(MicroModel::new()),
        ModelFamily::M6eNano => Arc::new(NanoModel::new()),
        ModelFamily::Unknown(_) => Arc::new(GenericModel::new(family)),
    }
}
