// libuhf-rs/libuhf/src/error.rs

use thiserror::Error;

use crate::protocol::status::Fault;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    // --- communication ---
    #[error("operation timed out")]
    Timeout,

    #[error("transport is not open")]
    NotConnected,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // 実機シリアルポートは feature で切り替える
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("crc mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("start marker not found after skipping {skipped} bytes")]
    StartMarkerNotFound { skipped: usize },

    #[error("device reset detected: sent opcode {sent:#04x}, received {received:#04x}")]
    DeviceReset { sent: u8, received: u8 },

    #[error("failed to send frame: {source}")]
    SendFailed {
        frame: Vec<u8>,
        #[source]
        source: Box<Error>,
    },

    #[error("no baud rate answered a version probe")]
    BaudNegotiationFailed,

    // --- device ---
    #[error("device fault: {0}")]
    Device(#[from] Fault),

    // --- validation ---
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    // --- parse ---
    #[error("invalid packet length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("frame format error: {0}")]
    FrameFormat(String),

    #[error("unexpected response: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("unknown antenna pairing tx={tx} rx={rx}")]
    UnknownAntenna { tx: u8, rx: u8 },

    #[error("parse error: {0}")]
    Parse(String),
}

/// Broad error family, used by the read engines to decide whether to
/// continue, drain or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Communication,
    Device,
    Validation,
    Parse,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout
            | Error::NotConnected
            | Error::Io(_)
            | Error::CrcMismatch { .. }
            | Error::StartMarkerNotFound { .. }
            | Error::DeviceReset { .. }
            | Error::SendFailed { .. }
            | Error::BaudNegotiationFailed => ErrorKind::Communication,
            #[cfg(feature = "serial")]
            Error::Serial(_) => ErrorKind::Communication,
            Error::Device(_) => ErrorKind::Device,
            Error::InvalidArgument(_)
            | Error::UnsupportedOperation(_)
            | Error::InvalidState(_) => ErrorKind::Validation,
            Error::InvalidLength { .. }
            | Error::FrameFormat(_)
            | Error::UnexpectedResponse { .. }
            | Error::UnknownAntenna { .. }
            | Error::Parse(_) => ErrorKind::Parse,
        }
    }

    /// The device fault carried by this error, if any.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Error::Device(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_no_tags_found(&self) -> bool {
        matches!(self, Error::Device(Fault::NoTagsFound))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
