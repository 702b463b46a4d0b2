use std::time::Duration;

use libuhf::constants::opcode;
use libuhf::prelude::*;

#[path = "../common/mod.rs"]
mod common;

fn weighted(weights: &[u32]) -> MultiReadPlan {
    MultiReadPlan::new(
        weights
            .iter()
            .map(|&w| common::fixtures::gen2_plan(&[1]).with_weight(w))
            .collect(),
    )
}

#[test]
fn time_is_split_by_weight() {
    assert_eq!(weighted(&[1, 3]).allocate(4000), vec![1000, 3000]);
}

#[test]
fn zero_weights_split_evenly() {
    assert_eq!(weighted(&[0, 0]).allocate(4000), vec![2000, 2000]);
}

#[test]
fn configured_plan_drives_the_search_antennas() {
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    reader
        .set_param(
            keys::READ_PLAN,
            ParamValue::ReadPlan(ReadPlan::Simple(common::fixtures::gen2_plan(&[2, 3]))),
        )
        .unwrap();
    mock.always(opcode::CLEAR_TAG_ID_BUFFER, vec![common::reply(opcode::CLEAR_TAG_ID_BUFFER, 0, &[])]);
    mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![common::no_tags(opcode::READ_TAG_ID_MULTIPLE)]);

    reader.read(Duration::from_millis(20)).unwrap();
    let search = mock
        .written()
        .into_iter()
        .find(|f| f[2] == opcode::READ_TAG_ID_MULTIPLE)
        .unwrap();
    // [FF][len][22][opt][flags u16][timeout u16][meta u16][n][antennas...]
    assert_eq!(search[10], 2);
    assert_eq!(&search[11..13], &[0x22, 0x33]);
}
