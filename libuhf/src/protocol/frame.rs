// libuhf-rs/libuhf/src/protocol/frame.rs

use log::{trace, warn};

use crate::constants::{CRC_LEN, HEADER_LEN, MAX_ARGS_LEN, MAX_RESYNC_BYTES, SOF};
use crate::protocol::crc::crc16;
use crate::protocol::status::Fault;
use crate::transport::Transport;
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

/// Whether frames carry the trailing CRC-CCITT word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcMode {
    #[default]
    Enabled,
    /// Negotiated with the reader over USB links only.
    Disabled,
}

impl CrcMode {
    pub fn trailer_len(self) -> usize {
        match self {
            CrcMode::Enabled => CRC_LEN,
            CrcMode::Disabled => 0,
        }
    }
}

/// Reader wire frame.
/// Format: [SOF 0xFF] [Len(1)] [Opcode(1)] [Args(Len)] [CRC(2, BE, optional)]
/// CRC covers Len, Opcode and Args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub args: Vec<u8>,
}

impl Frame {
    pub fn new(opcode: u8, args: Vec<u8>) -> Self {
        Self { opcode, args }
    }

    /// Encode `opcode_and_args` (opcode first) into a full wire frame.
    pub fn encode(opcode_and_args: &[u8], crc: CrcMode) -> Result<Vec<u8>> {
        let Some((&opcode, args)) = opcode_and_args.split_first() else {
            return Err(Error::InvalidArgument("frame needs an opcode".into()));
        };
        if args.len() > MAX_ARGS_LEN {
            return Err(Error::InvalidLength {
                expected: MAX_ARGS_LEN,
                actual: args.len(),
            });
        }

        let mut out = Vec::with_capacity(HEADER_LEN + args.len() + crc.trailer_len());
        out.push(SOF);
        out.push(args.len() as u8);
        out.push(opcode);
        out.extend_from_slice(args);
        if crc == CrcMode::Enabled {
            let c = crc16(&out[1..]);
            out.extend_from_slice(&c.to_be_bytes());
        }
        Ok(out)
    }

    pub fn to_bytes(&self, crc: CrcMode) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(1 + self.args.len());
        body.push(self.opcode);
        body.extend_from_slice(&self.args);
        Self::encode(&body, crc)
    }

    /// Decode one frame from a buffer that ends where the frame ends.
    ///
    /// Leading bytes before the start marker are skipped, up to
    /// [`MAX_RESYNC_BYTES`]. With CRC enabled the trailing word is checked
    /// before the length byte is trusted, so a corrupted length surfaces as a
    /// CRC mismatch.
    pub fn decode(bytes: &[u8], crc: CrcMode) -> Result<Frame> {
        let skipped = bytes
            .iter()
            .position(|&b| b == SOF)
            .unwrap_or(bytes.len());
        if skipped >= MAX_RESYNC_BYTES || skipped == bytes.len() {
            return Err(Error::StartMarkerNotFound { skipped });
        }
        if skipped > 0 {
            warn!("skipped {} bytes before start marker", skipped);
        }
        let frame = &bytes[skipped..];

        let min = HEADER_LEN + crc.trailer_len();
        if frame.len() < min {
            return Err(Error::InvalidLength {
                expected: min,
                actual: frame.len(),
            });
        }

        let body_end = frame.len() - crc.trailer_len();
        if crc == CrcMode::Enabled {
            let expected = crc16(&frame[1..body_end]);
            let actual = u16::from_be_bytes([frame[body_end], frame[body_end + 1]]);
            if expected != actual {
                return Err(Error::CrcMismatch { expected, actual });
            }
        }

        let len = frame[1] as usize;
        if body_end != HEADER_LEN + len {
            return Err(Error::InvalidLength {
                expected: HEADER_LEN + len + crc.trailer_len(),
                actual: frame.len(),
            });
        }

        Ok(Frame {
            opcode: frame[2],
            args: frame[HEADER_LEN..body_end].to_vec(),
        })
    }

    /// Status word carried in the first two argument bytes of a response.
    pub fn status(&self) -> Result<u16> {
        crate::protocol::parser::be_u16_at(&self.args, 0)
    }

    /// Response payload after the status word.
    pub fn data(&self) -> &[u8] {
        self.args.get(2..).unwrap_or(&[])
    }

    /// Turn a non-zero status word into a typed device fault.
    pub fn check_status(&self) -> Result<()> {
        match Fault::from_status(self.status()?) {
            None => Ok(()),
            Some(fault) => Err(Error::Device(fault)),
        }
    }
}

/// Read one frame from a byte stream, realigning on the start marker.
pub fn read_frame(transport: &mut dyn Transport, crc: CrcMode, timeout_ms: u64) -> Result<Frame> {
    read_frame_polled(transport, crc, timeout_ms, timeout_ms)
}

/// Like [`read_frame`], but only the wait for the start marker is bounded by
/// `wait_ms`; once it arrives the rest of the frame gets `body_ms`.
///
/// Bytes ahead of the start marker are discarded one at a time; once
/// [`MAX_RESYNC_BYTES`] have been skipped the read fails with
/// [`Error::StartMarkerNotFound`]. A timeout while waiting for the marker
/// consumes nothing that belongs to a frame.
pub fn read_frame_polled(
    transport: &mut dyn Transport,
    crc: CrcMode,
    wait_ms: u64,
    body_ms: u64,
) -> Result<Frame> {
    let mut first = [0u8; 1];
    let mut skipped = 0usize;
    loop {
        transport.read_exact(&mut first, wait_ms)?;
        if first[0] == SOF {
            break;
        }
        skipped += 1;
        if skipped >= MAX_RESYNC_BYTES {
            return Err(Error::StartMarkerNotFound { skipped });
        }
    }
    if skipped > 0 {
        warn!("resynchronised after skipping {} bytes", skipped);
    }

    let mut hdr = [SOF; HEADER_LEN];
    transport.read_exact(&mut hdr[1..], body_ms)?;

    let len = hdr[1] as usize;
    let mut rest = vec![0u8; len + crc.trailer_len()];
    transport.read_exact(&mut rest, body_ms)?;

    if crc == CrcMode::Enabled {
        let mut covered = Vec::with_capacity(2 + len);
        covered.extend_from_slice(&hdr[1..]);
        covered.extend_from_slice(&rest[..len]);
        let expected = crc16(&covered);
        let actual = u16::from_be_bytes([rest[len], rest[len + 1]]);
        if expected != actual {
            return Err(Error::CrcMismatch { expected, actual });
        }
    }
    rest.truncate(len);

    let frame = Frame {
        opcode: hdr[2],
        args: rest,
    };
    trace!(
        "rx opcode={:#04x} args=[{}]",
        frame.opcode,
        bytes_to_hex_spaced(&frame.args)
    );
    Ok(frame)
}
