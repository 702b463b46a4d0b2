// libuhf-rs/libuhf/src/tag/parser.rs
//! Tag record decoding: metadata block, then the EPC block.

use std::convert::TryFrom;

use log::{debug, warn};

use crate::antenna::AntennaMap;
use crate::constants::GPIO_PIN_COUNT;
use crate::protocol::parser::Cursor;
use crate::tag::{MetadataFlags, TagReadRecord};
use crate::types::{Epc, GpioPin, TagProtocol};
use crate::Result;

const PC_LEN: usize = 2;
const XPC_LEN: usize = 2;
const EPC_CRC_LEN: usize = 2;
/// XI bit of the PC word: an XPC_W1 word follows.
const PC_XI: u8 = 0x02;
/// XEB bit of XPC_W1: an XPC_W2 word follows.
const XPC_XEB: u8 = 0x80;

/// What the parser needs to know beyond the bytes themselves.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub antennas: &'a AntennaMap,
    /// Protocol assumed when the record carries no protocol field.
    pub protocol: TagProtocol,
    /// Whether RSSI is reported as signed dBm (otherwise a raw unsigned value).
    pub rssi_in_dbm: bool,
}

/// Decode one record: metadata fields selected by `metadata`, consumed in
/// ascending bit order, then `[epc bits u16][epc block]`.
pub fn parse_record(
    c: &mut Cursor<'_>,
    metadata: MetadataFlags,
    ctx: &ParseContext<'_>,
) -> Result<TagReadRecord> {
    let mut rec = TagReadRecord::new(Epc::default(), ctx.protocol);

    if metadata.contains(MetadataFlags::READ_COUNT) {
        rec.read_count = c.u8()? as u32;
    }
    if metadata.contains(MetadataFlags::RSSI) {
        rec.rssi = if ctx.rssi_in_dbm {
            c.i8()? as i32
        } else {
            c.u8()? as i32
        };
    }
    if metadata.contains(MetadataFlags::ANTENNA) {
        rec.antenna = ctx.antennas.translate_wire(c.u8()?)?;
    }
    if metadata.contains(MetadataFlags::FREQUENCY) {
        rec.frequency_khz = c.u24()?;
    }
    if metadata.contains(MetadataFlags::TIMESTAMP) {
        rec.timestamp_offset_ms = c.u32()?;
    }
    if metadata.contains(MetadataFlags::PHASE) {
        rec.phase = c.u16()?;
    }
    if metadata.contains(MetadataFlags::PROTOCOL) {
        rec.protocol = TagProtocol::try_from(c.u8()?)?;
    }
    if metadata.contains(MetadataFlags::DATA) {
        let bits = c.u16()? as usize;
        rec.data = c.take(bits.div_ceil(8))?.to_vec();
    }
    if metadata.contains(MetadataFlags::GPIO) {
        let bitmap = c.u8()?;
        rec.gpio = (0..GPIO_PIN_COUNT)
            .map(|i| GpioPin {
                id: i + 1,
                high: bitmap & (1 << i) != 0,
                output: false,
            })
            .collect();
    }

    let bits = c.u16()? as usize;
    let block = c.take(bits.div_ceil(8))?;
    fill_identity(&mut rec, block);
    Ok(rec)
}

/// Split the EPC block into PC words, EPC and CRC.
///
/// A negative EPC length (PC/XPC bits claiming more words than the block
/// holds) leaves `crc` unset so the record is treated as corrupt. The bytes
/// are still consumed by the caller.
fn fill_identity(rec: &mut TagReadRecord, block: &[u8]) {
    let mut pc_len = 0usize;
    if rec.protocol.has_pc_word() {
        pc_len = PC_LEN;
        if block.first().is_some_and(|b| b & PC_XI != 0) {
            pc_len += XPC_LEN;
            if block.get(PC_LEN).is_some_and(|b| b & XPC_XEB != 0) {
                pc_len += XPC_LEN;
            }
        }
    }

    let epc_len = block.len() as isize - pc_len as isize - EPC_CRC_LEN as isize;
    if epc_len < 0 {
        warn!(
            "dropping tag record: {} byte id block too short for {} PC bytes",
            block.len(),
            pc_len
        );
        rec.pc = block[..pc_len.min(block.len())].to_vec();
        rec.crc = None;
        return;
    }

    let epc_end = pc_len + epc_len as usize;
    rec.pc = block[..pc_len].to_vec();
    rec.epc = Epc::from_bytes(&block[pc_len..epc_end]);
    rec.crc = Some(u16::from_be_bytes([block[epc_end], block[epc_end + 1]]));
}

/// Decode `count` back-to-back records, as returned by a tag-buffer fetch.
pub fn parse_records(
    bytes: &[u8],
    count: usize,
    metadata: MetadataFlags,
    ctx: &ParseContext<'_>,
) -> Result<Vec<TagReadRecord>> {
    let mut c = Cursor::new(bytes);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(parse_record(&mut c, metadata, ctx)?);
    }
    if !c.is_empty() {
        debug!("{} trailing bytes after {} tag records", c.remaining(), count);
    }
    Ok(out)
}

/// Streamed tag payload: `[metadata u16][record]`.
pub fn parse_stream_record(bytes: &[u8], ctx: &ParseContext<'_>) -> Result<TagReadRecord> {
    let mut c = Cursor::new(bytes);
    let metadata = MetadataFlags::from_bits(c.u16()?)?;
    parse_record(&mut c, metadata, ctx)
}
