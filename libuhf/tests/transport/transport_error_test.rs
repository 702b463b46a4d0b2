#[path = "../common/mod.rs"]
mod common;

use libuhf::constants::opcode;
use libuhf::prelude::*;
use libuhf::reader::Channel;

fn channel(mock: &MockTransport) -> Channel {
    let mut ch = Channel::new(Box::new(mock.clone()), 20);
    ch.set_power_mode(PowerMode::Full);
    ch
}

#[test]
fn failed_write_keeps_the_frame() {
    let mock = MockTransport::new();
    mock.fail_next_writes(1);
    let mut ch = channel(&mock);

    match ch.transact(&[opcode::VERSION], 10) {
        Err(Error::SendFailed { frame, source }) => {
            assert_eq!(frame, common::fixtures::version_command_frame());
            assert!(source.is_timeout());
        }
        other => panic!("unexpected {:?}", other),
    }

    mock.on_opcode(opcode::VERSION, vec![common::version_reply(0x18, 0x10)]);
    assert!(ch.transact(&[opcode::VERSION], 10).is_ok());
}

#[test]
fn foreign_opcode_means_reset() {
    let mock = MockTransport::new();
    mock.on_opcode(opcode::GET_REGION, vec![common::reply(opcode::VERSION, 0, &[])]);
    let mut ch = channel(&mock);

    match ch.transact(&[opcode::GET_REGION], 10) {
        Err(Error::DeviceReset { sent, received }) => {
            assert_eq!(sent, opcode::GET_REGION);
            assert_eq!(received, opcode::VERSION);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ch.power_mode(), PowerMode::Unknown);
}

#[test]
fn no_reply_is_a_communication_error() {
    let mock = MockTransport::new();
    let mut ch = channel(&mock);
    let err = ch.transact(&[opcode::VERSION], 10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);
}
