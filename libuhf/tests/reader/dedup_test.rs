use libuhf::prelude::*;
use libuhf::read::{DedupPolicy, fold};
use proptest::prelude::*;

fn record(epc: u8, antenna: u32, count: u32, rssi: i32) -> TagReadRecord {
    let mut r = TagReadRecord::new(Epc::from_bytes(&[0xE2, epc]), TagProtocol::Gen2);
    r.antenna = antenna;
    r.read_count = count;
    r.rssi = rssi;
    r.crc = Some(0xABCD);
    r
}

fn records() -> impl Strategy<Value = Vec<TagReadRecord>> {
    prop::collection::vec((0u8..4, 1u32..3, 1u32..5, -90i32..-30), 0..40)
        .prop_map(|v| v.into_iter().map(|(e, a, c, r)| record(e, a, c, r)).collect())
}

fn policies() -> impl Strategy<Value = DedupPolicy> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(by_antenna, by_protocol, highest)| {
        DedupPolicy {
            enabled: true,
            unique_by_antenna: by_antenna,
            unique_by_data: false,
            unique_by_protocol: by_protocol,
            record_highest_rssi: highest,
        }
    })
}

proptest! {
    #[test]
    fn folding_twice_changes_nothing(recs in records(), policy in policies()) {
        let once = fold(recs, &policy);
        let twice = fold(once.clone(), &policy);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn read_counts_are_conserved(recs in records(), policy in policies()) {
        let total: u32 = recs.iter().map(|r| r.read_count).sum();
        let folded = fold(recs, &policy);
        prop_assert_eq!(folded.iter().map(|r| r.read_count).sum::<u32>(), total);
    }

    #[test]
    fn highest_rssi_wins(recs in records()) {
        let policy = DedupPolicy { record_highest_rssi: true, ..DedupPolicy::default() };
        let folded = fold(recs.clone(), &policy);
        for kept in &folded {
            let best = recs
                .iter()
                .filter(|r| r.epc == kept.epc)
                .map(|r| r.rssi)
                .max()
                .unwrap();
            prop_assert_eq!(kept.rssi, best);
        }
    }
}

#[test]
fn disabled_policy_passes_reads_through() {
    let policy = DedupPolicy {
        enabled: false,
        ..DedupPolicy::default()
    };
    let recs = vec![record(1, 1, 1, -50), record(1, 1, 1, -50)];
    assert_eq!(fold(recs, &policy).len(), 2);
}
