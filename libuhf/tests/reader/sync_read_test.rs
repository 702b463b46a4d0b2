#[path = "../common/mod.rs"]
mod common;

use std::time::{Duration, Instant};

use libuhf::constants::opcode;
use libuhf::prelude::*;

use common::TagSpec;

fn script_searches(mock: &MockTransport) {
    mock.always(opcode::CLEAR_TAG_ID_BUFFER, vec![common::reply(opcode::CLEAR_TAG_ID_BUFFER, 0, &[])]);
    mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![common::no_tags(opcode::READ_TAG_ID_MULTIPLE)]);
}

#[test]
fn quiet_field_reads_nothing_for_the_whole_window() {
    common::init_logger();
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    script_searches(&mock);

    let started = Instant::now();
    let tags = reader.read(Duration::from_millis(500)).unwrap();
    assert!(tags.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(450));
    assert!(mock.written_opcodes().contains(&opcode::READ_TAG_ID_MULTIPLE));
}

#[test]
fn repeated_epcs_are_folded_across_searches() {
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    let meta = MetadataFlags::ALL;
    mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![common::search_reply(2)]);
    mock.on_opcode(
        opcode::GET_TAG_ID_BUFFER,
        vec![common::tag_buffer_reply(
            meta,
            &[
                TagSpec::new(&[0xE2, 0x01]).count(2).rssi(-70),
                TagSpec::new(&[0xE2, 0x02]),
            ],
        )],
    );
    mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![common::search_reply(1)]);
    mock.on_opcode(
        opcode::GET_TAG_ID_BUFFER,
        vec![common::tag_buffer_reply(meta, &[TagSpec::new(&[0xE2, 0x01]).count(3).rssi(-40)])],
    );
    script_searches(&mock);

    let tags = reader.read(Duration::from_millis(100)).unwrap();
    assert_eq!(tags.len(), 2);
    let first = &tags[0];
    assert_eq!(first.epc.as_bytes(), &[0xE2, 0x01]);
    assert_eq!(first.read_count, 5);
    assert_eq!(first.rssi, -70);
    assert!(first.timestamp().is_some());
}

#[test]
fn filtering_off_keeps_every_read() {
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    reader
        .set_param(keys::ENABLE_READ_FILTERING, ParamValue::Bool(false))
        .unwrap();
    let spec = TagSpec::new(&[0x11, 0x22]);
    mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![common::search_reply(2)]);
    mock.on_opcode(
        opcode::GET_TAG_ID_BUFFER,
        vec![common::tag_buffer_reply(MetadataFlags::ALL, &[spec.clone(), spec])],
    );
    script_searches(&mock);

    let tags = reader.read(Duration::from_millis(50)).unwrap();
    assert_eq!(tags.len(), 2);
}

#[test]
fn corrupt_records_never_reach_the_caller() {
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![common::search_reply(2)]);
    mock.on_opcode(
        opcode::GET_TAG_ID_BUFFER,
        vec![common::tag_buffer_reply(
            MetadataFlags::ALL,
            &[TagSpec::new(&[0x01]).corrupt(), TagSpec::new(&[0x02])],
        )],
    );
    script_searches(&mock);

    let tags = reader.read(Duration::from_millis(50)).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].epc.as_bytes(), &[0x02]);
}
