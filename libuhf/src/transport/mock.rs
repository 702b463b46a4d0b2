// libuhf-rs/libuhf/src/transport/mock.rs

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::constants::{DEFAULT_BAUD_RATE, SOF};
use crate::transport::traits::Transport;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    baud: u32,
    usb: bool,
    rx: VecDeque<u8>,
    /// One-shot reply sets, consumed in order per written opcode.
    scripted: HashMap<u8, VecDeque<Vec<Vec<u8>>>>,
    /// Replies used whenever no one-shot reply is queued for an opcode.
    sticky: HashMap<u8, Vec<Vec<u8>>>,
    written: Vec<Vec<u8>>,
    wakeups: usize,
    responsive_baud: Option<u32>,
    write_failures: usize,
    /// Serial-port pacing: one byte per interval, partial reads lost.
    byte_interval: Option<Duration>,
}

/// Scripted in-memory transport for tests.
///
/// Replies are keyed by the opcode of each written frame: when the host
/// writes a frame, the next queued reply set for that opcode is appended to
/// the receive buffer. The handle is cheap to clone so a test can keep a
/// probe while the reader owns the transport.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let state = MockState {
            baud: DEFAULT_BAUD_RATE,
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_usb(&self, usb: bool) {
        self.state.lock().usb = usb;
    }

    /// Append raw bytes to the receive buffer immediately.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.state.lock().rx.extend(bytes.iter().copied());
    }

    /// Queue a one-shot reply: the next write of `opcode` releases `frames`.
    pub fn on_opcode(&self, opcode: u8, frames: Vec<Vec<u8>>) {
        self.state
            .lock()
            .scripted
            .entry(opcode)
            .or_default()
            .push_back(frames);
    }

    /// Reply with `frames` to every write of `opcode` that has no one-shot
    /// reply queued.
    pub fn always(&self, opcode: u8, frames: Vec<Vec<u8>>) {
        self.state.lock().sticky.insert(opcode, frames);
    }

    /// Only answer while the port is set to `baud`.
    pub fn respond_only_at(&self, baud: u32) {
        self.state.lock().responsive_baud = Some(baud);
    }

    /// Make the next `n` non-preamble writes fail with a timeout.
    pub fn fail_next_writes(&self, n: usize) {
        self.state.lock().write_failures = n;
    }

    /// Hand received bytes out one at a time, `per_byte` apart. A read that
    /// times out keeps the bytes it already took, like a real serial port.
    pub fn pace_reads(&self, per_byte: Duration) {
        self.state.lock().byte_interval = Some(per_byte);
    }

    fn read_paced(&self, buf: &mut [u8], timeout_ms: u64, per_byte: Duration) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        for slot in buf.iter_mut() {
            loop {
                if Instant::now() >= deadline {
                    return Err(Error::Timeout);
                }
                std::thread::sleep(per_byte);
                if let Some(b) = self.state.lock().rx.pop_front() {
                    *slot = b;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Every buffer passed to `write`, preambles excluded.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    /// Opcodes of the written frames, in order.
    pub fn written_opcodes(&self) -> Vec<u8> {
        self.state
            .lock()
            .written
            .iter()
            .filter_map(|f| f.get(2).copied())
            .collect()
    }

    pub fn wakeup_count(&self) -> usize {
        self.state.lock().wakeups
    }

    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, _port: &str) -> Result<()> {
        self.state.lock().open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().open = false;
        Ok(())
    }

    fn write(&mut self, data: &[u8], _timeout_ms: u64) -> Result<()> {
        let mut st = self.state.lock();
        if !data.is_empty() && data.iter().all(|&b| b == SOF) {
            st.wakeups += 1;
            return Ok(());
        }
        if st.write_failures > 0 {
            st.write_failures -= 1;
            return Err(Error::Timeout);
        }
        st.written.push(data.to_vec());

        if let Some(baud) = st.responsive_baud {
            if baud != st.baud {
                return Ok(());
            }
        }
        let Some(&opcode) = data.get(2) else {
            return Ok(());
        };
        let queued = st.scripted.get_mut(&opcode).and_then(|q| q.pop_front());
        let frames = match queued {
            Some(frames) => frames,
            None => st.sticky.get(&opcode).cloned().unwrap_or_default(),
        };
        for f in frames {
            st.rx.extend(f);
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8], timeout_ms: u64) -> Result<()> {
        let paced = self.state.lock().byte_interval;
        if let Some(per_byte) = paced {
            return self.read_paced(buf, timeout_ms, per_byte);
        }
        {
            let mut st = self.state.lock();
            if st.rx.len() >= buf.len() {
                for b in buf.iter_mut() {
                    *b = st.rx.pop_front().unwrap_or_default();
                }
                return Ok(());
            }
        }
        // Nothing (complete) to hand out; behave like a short blocking read.
        std::thread::sleep(Duration::from_millis(timeout_ms.min(5)));
        Err(Error::Timeout)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        self.state.lock().baud = baud;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.state.lock().baud
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn is_usb(&self) -> bool {
        self.state.lock().usb
    }

    fn flush_input(&mut self) -> Result<()> {
        self.state.lock().rx.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_transport_basic() {
        let mut m = MockTransport::new();
        m.push_rx(&[0x01]);
        m.write(&[0xFF, 0x00, 0x03, 0x00, 0x00], 100).unwrap();
        assert_eq!(m.written().len(), 1);
        let mut buf = [0u8; 1];
        m.read_exact(&mut buf, 100).unwrap();
        assert_eq!(buf, [0x01]);
        assert!(matches!(m.read_exact(&mut buf, 1), Err(Error::Timeout)));
    }

    #[test]
    fn scripted_replies_are_one_shot_then_sticky() {
        let mut m = MockTransport::new();
        m.on_opcode(0x03, vec![vec![0xAA]]);
        m.always(0x03, vec![vec![0xBB]]);
        let mut buf = [0u8; 1];

        m.write(&[0xFF, 0x00, 0x03], 100).unwrap();
        m.read_exact(&mut buf, 100).unwrap();
        assert_eq!(buf, [0xAA]);

        m.write(&[0xFF, 0x00, 0x03], 100).unwrap();
        m.read_exact(&mut buf, 100).unwrap();
        assert_eq!(buf, [0xBB]);
        assert_eq!(m.written_opcodes(), vec![0x03, 0x03]);
    }

    #[test]
    fn paced_read_loses_partial_bytes_on_timeout() {
        let mut m = MockTransport::new();
        m.pace_reads(Duration::from_millis(2));
        m.push_rx(&[0x01; 40]);
        let mut buf = [0u8; 40];
        assert!(matches!(m.read_exact(&mut buf, 10), Err(Error::Timeout)));
        assert!(m.pending_rx() < 40);
    }

    #[test]
    fn preamble_is_counted_not_logged() {
        let mut m = MockTransport::new();
        m.write(&[0xFF; 32], 100).unwrap();
        assert_eq!(m.wakeup_count(), 1);
        assert!(m.written().is_empty());
    }

    #[test]
    fn silent_at_wrong_baud() {
        let mut m = MockTransport::new();
        m.respond_only_at(9600);
        m.always(0x03, vec![vec![0xAA]]);
        m.write(&[0xFF, 0x00, 0x03], 100).unwrap();
        assert_eq!(m.pending_rx(), 0);
        m.set_baud_rate(9600).unwrap();
        m.write(&[0xFF, 0x00, 0x03], 100).unwrap();
        assert_eq!(m.pending_rx(), 1);
    }

    #[test]
    fn partial_buffer_is_not_consumed() {
        let mut m = MockTransport::new();
        m.push_rx(&[0x01, 0x02]);
        let mut buf = [0u8; 3];
        assert!(m.read_exact(&mut buf, 1).is_err());
        assert_eq!(m.pending_rx(), 2);
    }
}
