#[path = "../common/mod.rs"]
mod common;

use libuhf::prelude::*;

#[test]
fn connected_reader_maps_every_physical_port() {
    let mock = MockTransport::new();
    let reader = common::connected_reader(&mock, 0x18).unwrap();
    let map = reader.antenna_map();
    assert_eq!(map.logical_ids(), vec![1, 2, 3, 4]);
    for id in map.logical_ids() {
        let wire = map.wire_byte(id).unwrap();
        assert_eq!(map.translate_wire(wire).unwrap(), id);
    }
}

#[test]
fn custom_map_is_a_bijection() {
    let mock = MockTransport::new();
    let reader = common::connected_reader(&mock, 0x18).unwrap();
    let ports = [AntennaPort::new(1, 1, 2), AntennaPort::new(2, 3, 3)];
    reader.set_antenna_map(&ports).unwrap();

    let map = reader.antenna_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map.wire_byte(1).unwrap(), 0x12);
    assert_eq!(map.translate_wire(0x33).unwrap(), 2);
    assert_eq!(map.ports(), ports.to_vec());
}

#[test]
fn rejected_map_leaves_previous_one_installed() {
    let mock = MockTransport::new();
    let reader = common::connected_reader(&mock, 0x18).unwrap();
    let before = reader.antenna_map();

    let err = reader
        .set_antenna_map(&[AntennaPort::new(1, 1, 1), AntennaPort::new(2, 9, 9)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(*reader.antenna_map(), *before);

    assert!(reader
        .set_antenna_map(&[AntennaPort::new(5, 1, 1), AntennaPort::new(5, 2, 2)])
        .is_err());
    assert_eq!(*reader.antenna_map(), *before);
}

#[test]
fn unknown_wire_byte_is_reported_with_ports() {
    let map = AntennaMap::monostatic(&[1, 2]);
    match map.translate_wire(0x21) {
        Err(Error::UnknownAntenna { tx: 2, rx: 1 }) => {}
        other => panic!("unexpected {:?}", other),
    }
}
