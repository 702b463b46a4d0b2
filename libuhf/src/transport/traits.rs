// libuhf-rs/libuhf/src/transport/traits.rs

use crate::Result;

/// Transport trait abstracts the byte stream away from protocol/reader logic.
///
/// Timeouts are in milliseconds. `read_exact` either fills the whole buffer
/// or fails; a transport that ran out of time returns [`crate::Error::Timeout`].
pub trait Transport: Send {
    /// Open the underlying port (device path, COM name, ...).
    fn open(&mut self, port: &str) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    /// Write all bytes to the device.
    fn write(&mut self, data: &[u8], timeout_ms: u64) -> Result<()>;

    /// Read exactly `buf.len()` bytes.
    fn read_exact(&mut self, buf: &mut [u8], timeout_ms: u64) -> Result<()>;

    fn set_baud_rate(&mut self, baud: u32) -> Result<()>;

    fn baud_rate(&self) -> u32;

    fn is_open(&self) -> bool;

    /// USB-CDC links may negotiate CRC-less framing with the reader.
    fn is_usb(&self) -> bool {
        false
    }

    /// Discard any buffered input. Default is a no-op.
    fn flush_input(&mut self) -> Result<()> {
        Ok(())
    }
}
