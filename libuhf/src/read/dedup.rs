// libuhf-rs/libuhf/src/read/dedup.rs

use std::collections::HashMap;

use crate::tag::TagReadRecord;
use crate::types::TagProtocol;

/// Which fields make two reads "the same tag".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupPolicy {
    pub enabled: bool,
    pub unique_by_antenna: bool,
    pub unique_by_data: bool,
    pub unique_by_protocol: bool,
    pub record_highest_rssi: bool,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            unique_by_antenna: false,
            unique_by_data: false,
            unique_by_protocol: true,
            record_highest_rssi: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    epc: Vec<u8>,
    data: Option<Vec<u8>>,
    antenna: Option<u32>,
    protocol: Option<TagProtocol>,
}

impl DedupKey {
    pub fn of(rec: &TagReadRecord, policy: &DedupPolicy) -> Self {
        Self {
            epc: rec.epc.as_bytes().to_vec(),
            data: policy.unique_by_data.then(|| rec.data.clone()),
            antenna: policy.unique_by_antenna.then_some(rec.antenna),
            protocol: policy.unique_by_protocol.then_some(rec.protocol),
        }
    }
}

/// Fold repeat reads into one record per key, keeping first-seen order.
///
/// Read counts are summed. With `record_highest_rssi` a stronger later read
/// replaces the stored fields but not the accumulated count.
pub fn fold(records: Vec<TagReadRecord>, policy: &DedupPolicy) -> Vec<TagReadRecord> {
    if !policy.enabled {
        return records;
    }
    let mut index: HashMap<DedupKey, usize> = HashMap::new();
    let mut out: Vec<TagReadRecord> = Vec::with_capacity(records.len());
    for rec in records {
        let key = DedupKey::of(&rec, policy);
        match index.get(&key) {
            Some(&i) => {
                let kept = &mut out[i];
                let total = kept.read_count + rec.read_count;
                if policy.record_highest_rssi && rec.rssi > kept.rssi {
                    *kept = rec;
                }
                kept.read_count = total;
            }
            None => {
                index.insert(key, out.len());
                out.push(rec);
            }
        }
    }
    out
}
