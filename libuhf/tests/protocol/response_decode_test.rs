#[path = "../common/mod.rs"]
mod common;

use libuhf::antenna::AntennaMap;
use libuhf::protocol::parser::Cursor;
use libuhf::protocol::{CrcMode, Frame, Response};
use libuhf::tag::{ParseContext, parse_record, parse_records};
use libuhf::types::{ModelFamily, TagProtocol};

use common::TagSpec;

fn ctx(map: &AntennaMap) -> ParseContext<'_> {
    ParseContext {
        antennas: map,
        protocol: TagProtocol::Gen2,
        rssi_in_dbm: true,
    }
}

#[test]
fn version_reply_decodes() {
    let bytes = common::version_reply(0x30, 0x10);
    let frame = Frame::decode(&bytes, CrcMode::Enabled).unwrap();
    match Response::decode(&libuhf::protocol::Command::Version, frame.data()).unwrap() {
        Response::Version(v) => {
            assert_eq!(v.model(), ModelFamily::M6eNano);
            assert_eq!(v.supported_protocols(), vec![TagProtocol::Gen2]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn record_fields_follow_metadata() {
    let map = AntennaMap::monostatic(&[1, 2]);
    let epc = common::fixtures::sample_epc();
    let raw = TagSpec::new(&epc).antenna(0x22).count(4).rssi(-61).encode(common::fixtures::meta());
    let rec = parse_record(&mut Cursor::new(&raw), common::fixtures::meta(), &ctx(&map)).unwrap();
    assert_eq!(rec.epc.as_bytes(), epc.as_slice());
    assert_eq!(rec.read_count, 4);
    assert_eq!(rec.rssi, -61);
    assert_eq!(rec.antenna, 2);
    assert_eq!(rec.pc, vec![0x30, 0x00]);
    assert!(!rec.is_corrupt());
}

#[test]
fn corrupt_record_is_marked_and_consumed() {
    let map = AntennaMap::monostatic(&[1]);
    let meta = common::fixtures::meta();
    let specs = [
        TagSpec::new(&[0x01, 0x02]),
        TagSpec::new(&[0x03]).corrupt(),
        TagSpec::new(&[0x04, 0x05]),
    ];
    let bytes: Vec<u8> = specs.iter().flat_map(|s| s.encode(meta)).collect();
    let recs = parse_records(&bytes, 3, meta, &ctx(&map)).unwrap();
    assert_eq!(recs.len(), 3);
    assert_eq!(recs.iter().filter(|r| r.is_corrupt()).count(), 1);
    assert_eq!(recs[2].epc.as_bytes(), &[0x04, 0x05]);
}

#[test]
fn unknown_antenna_pairing_is_a_parse_fault() {
    let map = AntennaMap::monostatic(&[1]);
    let raw = TagSpec::new(&[0x01]).antenna(0x33).encode(common::fixtures::meta());
    let err = parse_record(&mut Cursor::new(&raw), common::fixtures::meta(), &ctx(&map)).unwrap_err();
    assert_eq!(err.kind(), libuhf::ErrorKind::Parse);
}
