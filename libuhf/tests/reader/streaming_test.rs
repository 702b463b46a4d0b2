#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use libuhf::constants::opcode;
use libuhf::protocol::status::codes;
use libuhf::prelude::*;

use common::TagSpec;

const WAIT: Duration = Duration::from_secs(2);

fn meta() -> MetadataFlags {
    MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA
}

#[test]
fn buffer_full_recovers_without_losing_later_reads() {
    common::init_logger();
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    mock.on_opcode(
        opcode::MULTI_PROTOCOL_TAG_OP,
        vec![
            common::stream_fault_frame(codes::TAG_ID_BUFFER_FULL),
            common::stream_tag_frame(meta(), &TagSpec::new(&[0xDD])),
        ],
    );
    mock.on_opcode(
        opcode::MULTI_PROTOCOL_TAG_OP,
        vec![common::stream_tag_frame(meta(), &TagSpec::new(&[0xAA]))],
    );
    mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![common::stop_ack()]);

    let events = reader.start_reading().unwrap();
    assert!(reader.is_reading());

    let mut tags = Vec::new();
    let mut faults = 0;
    while tags.is_empty() {
        match events.recv_timeout(WAIT).unwrap() {
            ReadEvent::Tag(t) => tags.push(t),
            ReadEvent::Exception(Error::Device(Fault::TagBufferFull)) => faults += 1,
            _ => {}
        }
    }
    reader.stop_reading().unwrap();

    assert_eq!(faults, 1);
    assert_eq!(tags[0].epc.as_bytes(), &[0xAA]);
    assert!(!reader.is_reading());
    assert_eq!(mock.pending_rx(), 0);
}

#[test]
fn commands_resume_after_stop() {
    let mock = MockTransport::new();
    let mut reader = common::connected_reader(&mock, 0x18).unwrap();
    mock.on_opcode(
        opcode::MULTI_PROTOCOL_TAG_OP,
        vec![common::stream_tag_frame(meta(), &TagSpec::new(&[0x01]))],
    );
    mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![common::stop_ack()]);

    let events = reader.start_reading().unwrap();
    assert!(matches!(events.recv_timeout(WAIT), Ok(ReadEvent::Tag(_))));
    assert!(reader.commands().is_err());
    reader.stop_reading().unwrap();
    assert!(reader.commands().is_ok());
}
