use libuhf::prelude::*;

#[test]
fn scripted_reply_follows_the_written_opcode() {
    let mut mock = MockTransport::new();
    let probe = mock.clone();
    mock.on_opcode(0x03, vec![vec![0xAA, 0xBB]]);

    mock.open("mock").unwrap();
    assert!(mock.is_open());
    mock.write(&[0xFF, 0x00, 0x03, 0x2D, 0x6C], 10).unwrap();
    assert_eq!(probe.pending_rx(), 2);

    let mut buf = [0u8; 2];
    mock.read_exact(&mut buf, 10).unwrap();
    assert_eq!(buf, [0xAA, 0xBB]);
    assert_eq!(probe.written_opcodes(), vec![0x03]);
}

#[test]
fn short_read_times_out() {
    let mut mock = MockTransport::new();
    mock.push_rx(&[0x01]);
    let mut buf = [0u8; 4];
    assert!(matches!(mock.read_exact(&mut buf, 5), Err(Error::Timeout)));
}

#[test]
fn wrong_baud_stays_silent() {
    let mut mock = MockTransport::new();
    mock.respond_only_at(115_200);
    mock.on_opcode(0x03, vec![vec![0xAA]]);

    mock.set_baud_rate(9_600).unwrap();
    mock.write(&[0xFF, 0x00, 0x03, 0x2D, 0x6C], 10).unwrap();
    assert_eq!(mock.pending_rx(), 0);

    mock.set_baud_rate(115_200).unwrap();
    mock.write(&[0xFF, 0x00, 0x03, 0x2D, 0x6C], 10).unwrap();
    assert_eq!(mock.pending_rx(), 1);
}

#[test]
fn preambles_are_counted_separately() {
    let mut mock = MockTransport::new();
    mock.write(&[0xFF; 8], 10).unwrap();
    mock.write(&[0xFF, 0x00, 0x03, 0x2D, 0x6C], 10).unwrap();
    assert_eq!(mock.wakeup_count(), 1);
    assert_eq!(mock.written().len(), 1);
}
