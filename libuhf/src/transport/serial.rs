// libuhf-rs/libuhf/src/transport/serial.rs

#![cfg(feature = "serial")]

use std::io::{self, Read, Write};
use std::time::Duration;

use log::debug;
use serialport::{ClearBuffer, SerialPort, SerialPortType};

use crate::constants::DEFAULT_BAUD_RATE;
use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Serial (UART or USB-CDC) link to a reader module.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    baud: u32,
    usb: bool,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD_RATE,
            usb: false,
        }
    }

    fn port(&mut self, timeout_ms: u64) -> Result<&mut Box<dyn SerialPort>> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.set_timeout(Duration::from_millis(timeout_ms.max(1)))?;
        Ok(port)
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
        _ => Error::Io(e),
    }
}

/// Whether the OS enumerates `path` as a USB device.
fn is_usb_port(path: &str) -> bool {
    match serialport::available_ports() {
        Ok(ports) => ports
            .iter()
            .any(|p| p.port_name == path && matches!(p.port_type, SerialPortType::UsbPort(_))),
        Err(e) => {
            debug!("cannot enumerate serial ports: {}", e);
            false
        }
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, port: &str) -> Result<()> {
        let handle = serialport::new(port, self.baud)
            .timeout(Duration::from_millis(100))
            .open()?;
        self.usb = is_usb_port(port);
        debug!("opened {} at {} baud (usb: {})", port, self.baud, self.usb);
        self.port = Some(handle);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.port = None;
        Ok(())
    }

    fn write(&mut self, data: &[u8], timeout_ms: u64) -> Result<()> {
        let port = self.port(timeout_ms)?;
        port.write_all(data).map_err(map_io)?;
        port.flush().map_err(map_io)
    }

    fn read_exact(&mut self, buf: &mut [u8], timeout_ms: u64) -> Result<()> {
        self.port(timeout_ms)?.read_exact(buf).map_err(map_io)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        if let Some(port) = self.port.as_mut() {
            port.set_baud_rate(baud)?;
        }
        self.baud = baud;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn is_usb(&self) -> bool {
        self.usb
    }

    fn flush_input(&mut self) -> Result<()> {
        if let Some(port) = self.port.as_mut() {
            port.clear(ClearBuffer::Input)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopened_port_refuses_io() {
        let mut t = SerialTransport::new();
        assert!(!t.is_open());
        assert!(matches!(t.write(&[0xFF], 10), Err(Error::NotConnected)));
        let mut buf = [0u8; 1];
        assert!(matches!(t.read_exact(&mut buf, 10), Err(Error::NotConnected)));
    }

    #[test]
    fn baud_is_remembered_before_open() {
        let mut t = SerialTransport::new();
        t.set_baud_rate(921_600).unwrap();
        assert_eq!(t.baud_rate(), 921_600);
        t.flush_input().unwrap();
    }

    #[test]
    fn timeouts_map_to_timeout() {
        let e = map_io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(e.is_timeout());
        assert!(matches!(map_io(io::Error::other("x")), Error::Io(_)));
    }
}
