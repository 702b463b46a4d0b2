#[path = "../common/mod.rs"]
mod common;

use libuhf::protocol::{CrcMode, Frame, read_frame};
use libuhf::transport::MockTransport;
use libuhf::Error;

#[test]
fn version_command_matches_fixture() {
    let frame = Frame::encode(&[0x03], CrcMode::Enabled).unwrap();
    assert_eq!(frame, common::fixtures::version_command_frame());
}

#[test]
fn scripted_reply_decodes() {
    let bytes = common::reply(0x67, 0x0000, &[0x08]);
    let frame = Frame::decode(&bytes, CrcMode::Enabled).unwrap();
    assert_eq!(frame.opcode, 0x67);
    assert_eq!(frame.status().unwrap(), 0);
    assert_eq!(frame.data(), &[0x08]);
}

#[test]
fn garbage_before_reply_on_the_wire() {
    let mut mock = MockTransport::new();
    let mut bytes = vec![0x00, 0x13, 0x37, 0x42];
    bytes.extend(common::reply(0x03, 0, &[0xAA]));
    mock.push_rx(&bytes);
    let frame = read_frame(&mut mock, CrcMode::Enabled, 10).unwrap();
    assert_eq!(frame.data(), &[0xAA]);
    assert_eq!(mock.pending_rx(), 0);
}

#[test]
fn ten_garbage_bytes_is_fatal() {
    let mut mock = MockTransport::new();
    let mut bytes = vec![0x00; 10];
    bytes.extend(common::reply(0x03, 0, &[]));
    mock.push_rx(&bytes);
    assert!(matches!(
        read_frame(&mut mock, CrcMode::Enabled, 10),
        Err(Error::StartMarkerNotFound { .. })
    ));
}

#[test]
fn crc_less_reply() {
    let mut mock = MockTransport::new();
    mock.push_rx(&common::reply_without_crc(0x93, 0, &[]));
    let frame = read_frame(&mut mock, CrcMode::Disabled, 10).unwrap();
    assert_eq!(frame.opcode, 0x93);
    frame.check_status().unwrap();
}
