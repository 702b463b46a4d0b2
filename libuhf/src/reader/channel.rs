// libuhf-rs/libuhf/src/reader/channel.rs
//! One-request-at-a-time wire channel.
//!
//! The channel owns the transport plus the state that only makes sense
//! alongside it (CRC mode, cached power mode, current protocol). It is
//! shared as a [`Link`]; holding the lock is holding the wire.

use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::constants::{SOF, WAKEUP_PREAMBLE_MS, opcode};
use crate::protocol::frame::{CrcMode, Frame, read_frame, read_frame_polled};
use crate::transport::Transport;
use crate::types::{PowerMode, TagProtocol};
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

/// Shared handle on the wire. All transactions go through this lock.
pub type Link = Arc<Mutex<Channel>>;

pub struct Channel {
    transport: Box<dyn Transport>,
    crc: CrcMode,
    power_mode: PowerMode,
    wakeup_supported: bool,
    transport_timeout_ms: u64,
    current_protocol: Option<TagProtocol>,
}

impl Channel {
    pub fn new(transport: Box<dyn Transport>, transport_timeout_ms: u64) -> Self {
        Self {
            transport,
            crc: CrcMode::Enabled,
            power_mode: PowerMode::Unknown,
            wakeup_supported: true,
            transport_timeout_ms,
            current_protocol: None,
        }
    }

    pub fn into_link(self) -> Link {
        Arc::new(Mutex::new(self))
    }

    pub fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        &mut *self.transport
    }

    pub fn crc(&self) -> CrcMode {
        self.crc
    }

    pub fn set_crc(&mut self, crc: CrcMode) {
        debug!("crc mode -> {:?}", crc);
        self.crc = crc;
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    pub fn set_power_mode(&mut self, mode: PowerMode) {
        self.power_mode = mode;
    }

    pub fn set_wakeup_supported(&mut self, supported: bool) {
        self.wakeup_supported = supported;
    }

    pub fn transport_timeout_ms(&self) -> u64 {
        self.transport_timeout_ms
    }

    pub fn set_transport_timeout_ms(&mut self, ms: u64) {
        self.transport_timeout_ms = ms;
    }

    pub fn current_protocol(&self) -> Option<TagProtocol> {
        self.current_protocol
    }

    pub fn set_current_protocol(&mut self, protocol: Option<TagProtocol>) {
        self.current_protocol = protocol;
    }

    /// 0xFF filler covering [`WAKEUP_PREAMBLE_MS`] at the current baud rate
    /// (ten bits per byte on the wire).
    fn wakeup_preamble(&self) -> Vec<u8> {
        let bytes = self.transport.baud_rate() as u64 * WAKEUP_PREAMBLE_MS / 1000 / 10;
        vec![SOF; bytes.max(1) as usize]
    }

    /// Frame and write one command. A write failure comes back as
    /// [`Error::SendFailed`] carrying the frame.
    pub fn send(&mut self, opcode_and_args: &[u8]) -> Result<()> {
        let frame = Frame::encode(opcode_and_args, self.crc)?;
        if self.wakeup_supported && self.power_mode.needs_wakeup() {
            let preamble = self.wakeup_preamble();
            trace!("wakeup preamble of {} bytes", preamble.len());
            if let Err(e) = self.transport.write(&preamble, self.transport_timeout_ms) {
                return Err(Error::SendFailed {
                    frame,
                    source: Box::new(e),
                });
            }
        }
        trace!("tx [{}]", bytes_to_hex_spaced(&frame));
        match self.transport.write(&frame, self.transport_timeout_ms) {
            Ok(()) => Ok(()),
            Err(e) => Err(Error::SendFailed {
                frame,
                source: Box::new(e),
            }),
        }
    }

    /// Read one frame, waiting up to `timeout_ms`.
    pub fn receive(&mut self, timeout_ms: u64) -> Result<Frame> {
        read_frame(&mut *self.transport, self.crc, timeout_ms)
    }

    /// Wait up to `wait_ms` for a frame to begin; a frame that has begun is
    /// read to the end under the transport timeout.
    pub fn receive_polled(&mut self, wait_ms: u64) -> Result<Frame> {
        read_frame_polled(&mut *self.transport, self.crc, wait_ms, self.transport_timeout_ms)
    }

    /// Send a command and wait for its reply.
    ///
    /// `timeout_ms` is what the device itself may spend on the command; the
    /// transport timeout is added on top for the read. A reply with a
    /// different opcode means the module rebooted behind our back, except
    /// for a late stop acknowledgement from a finished stream, which is
    /// skipped. A non-zero status becomes [`Error::Device`].
    pub fn transact(&mut self, opcode_and_args: &[u8], timeout_ms: u64) -> Result<Frame> {
        let Some(&sent) = opcode_and_args.first() else {
            return Err(Error::InvalidArgument("empty command".into()));
        };
        self.send(opcode_and_args)?;
        let read_timeout = timeout_ms + self.transport_timeout_ms;
        loop {
            let frame = self.receive(read_timeout)?;
            if frame.opcode == sent {
                frame.check_status()?;
                return Ok(frame);
            }
            if frame.opcode == opcode::STREAM_STOP_ACK {
                debug!("skipping stale stop acknowledgement while waiting for {:#04x}", sent);
                continue;
            }
            warn!(
                "sent {:#04x} but got {:#04x}; assuming the module was reset",
                sent, frame.opcode
            );
            self.power_mode = PowerMode::Unknown;
            self.current_protocol = None;
            return Err(Error::DeviceReset {
                sent,
                received: frame.opcode,
            });
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("crc", &self.crc)
            .field("power_mode", &self.power_mode)
            .field("wakeup_supported", &self.wakeup_supported)
            .field("transport_timeout_ms", &self.transport_timeout_ms)
            .field("current_protocol", &self.current_protocol)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Fault;
    use crate::protocol::status::codes;
    use crate::test_support::reply;
    use crate::transport::MockTransport;

    fn channel(mock: &MockTransport) -> Channel {
        let mut ch = Channel::new(Box::new(mock.clone()), 50);
        ch.set_power_mode(PowerMode::Full);
        ch
    }

    #[test]
    fn transact_matches_opcode() {
        let mock = MockTransport::new();
        mock.on_opcode(0x67, vec![reply(0x67, 0, &[0x08])]);
        let mut ch = channel(&mock);
        let frame = ch.transact(&[0x67], 10).unwrap();
        assert_eq!(frame.data(), &[0x08]);
        assert_eq!(mock.written_opcodes(), vec![0x67]);
    }

    #[test]
    fn status_becomes_fault() {
        let mock = MockTransport::new();
        mock.on_opcode(0x22, vec![reply(0x22, codes::NO_TAGS_FOUND, &[])]);
        let mut ch = channel(&mock);
        let err = ch.transact(&[0x22], 10).unwrap_err();
        assert!(matches!(err, Error::Device(Fault::NoTagsFound)));
    }

    #[test]
    fn opcode_mismatch_is_reset() {
        let mock = MockTransport::new();
        mock.on_opcode(0x67, vec![reply(0x03, 0, &[])]);
        let mut ch = channel(&mock);
        ch.set_current_protocol(Some(TagProtocol::Gen2));
        let err = ch.transact(&[0x67], 10).unwrap_err();
        assert!(matches!(
            err,
            Error::DeviceReset {
                sent: 0x67,
                received: 0x03
            }
        ));
        assert_eq!(ch.power_mode(), PowerMode::Unknown);
        assert_eq!(ch.current_protocol(), None);
    }

    #[test]
    fn stale_stop_ack_is_skipped() {
        let mock = MockTransport::new();
        mock.on_opcode(0x67, vec![reply(0x2F, 0, &[]), reply(0x67, 0, &[0x01])]);
        let mut ch = channel(&mock);
        assert_eq!(ch.transact(&[0x67], 10).unwrap().data(), &[0x01]);
    }

    #[test]
    fn wakeup_only_when_sleeping_or_unknown() {
        let mock = MockTransport::new();
        mock.always(0x03, vec![reply(0x03, 0, &[])]);
        let mut ch = channel(&mock);
        ch.transact(&[0x03], 10).unwrap();
        assert_eq!(mock.wakeup_count(), 0);

        ch.set_power_mode(PowerMode::Sleep);
        ch.transact(&[0x03], 10).unwrap();
        assert_eq!(mock.wakeup_count(), 1);

        ch.set_wakeup_supported(false);
        ch.transact(&[0x03], 10).unwrap();
        assert_eq!(mock.wakeup_count(), 1);
    }

    #[test]
    fn write_failure_carries_frame() {
        let mock = MockTransport::new();
        mock.fail_next_writes(1);
        let mut ch = channel(&mock);
        match ch.transact(&[0x03], 10).unwrap_err() {
            Error::SendFailed { frame, source } => {
                assert_eq!(frame, vec![0xFF, 0x00, 0x03, 0x2D, 0x6C]);
                assert!(source.is_timeout());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn silence_is_timeout() {
        let mock = MockTransport::new();
        let mut ch = channel(&mock);
        assert!(ch.transact(&[0x03], 0).unwrap_err().is_timeout());
    }
}
