mod config;

use log::warn;

use crate::antenna::AntennaMap;
use crate::reader::models::DeviceModel;
use crate::types::{ModelFamily, ProductGroup};

#[derive(Debug)]
pub struct M6eModel;

impl M6eModel {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceModel for M6eModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::M6e
    }

    fn name(&self) -> &'static str {
        "M6e"
    }

    fn supports_crc_disable(&self) -> bool {
        true
    }

    fn physical_ports(&self) -> Vec<u8> {
        config::PHYSICAL_PORTS.to_vec()
    }

    fn read_power_range(&self) -> (i16, i16) {
        (config::MIN_POWER_CDBM, config::MAX_POWER_CDBM)
    }

    fn antenna_map(&self, group: ProductGroup) -> AntennaMap {
        match group {
            ProductGroup::RuggedizedReader => {
                match AntennaMap::new(config::RUGGEDIZED_MAP, config::PHYSICAL_PORTS) {
                    Ok(map) => map,
                    Err(e) => {
                        warn!("ruggedized antenna map rejected ({}), using monostatic", e);
                        AntennaMap::monostatic(config::PHYSICAL_PORTS)
                    }
                }
            }
            _ => AntennaMap::monostatic(config::PHYSICAL_PORTS),
        }
    }
}
