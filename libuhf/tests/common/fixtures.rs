// fixtures.rs — provides commonly used frames and plans

use libuhf::prelude::*;

/// Version query as it goes out on the wire.
pub fn version_command_frame() -> Vec<u8> {
    hex::decode("FF00032D6C").unwrap()
}

/// Metadata used by the scripted tag replies.
pub fn meta() -> MetadataFlags {
    MetadataFlags::READ_COUNT | MetadataFlags::RSSI | MetadataFlags::ANTENNA
}

pub fn gen2_plan(antennas: &[u32]) -> SimpleReadPlan {
    SimpleReadPlan::new(TagProtocol::Gen2, antennas.to_vec())
}

pub fn sample_epc() -> Vec<u8> {
    hex::decode("E2801160600002054E8A2B1C").unwrap()
}
