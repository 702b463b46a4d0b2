// libuhf-rs/libuhf/src/protocol/commands/search.rs

use crate::constants::{opcode, subcommand};
use crate::protocol::filter::TagFilter;
use crate::protocol::tagop::TagOp;
use crate::tag::MetadataFlags;
use crate::types::TagProtocol;
use crate::{Error, Result};

/// Option byte leading every single-protocol search.
pub const SEARCH_OPTIONS: u8 = 0x10;

/// Search flag bits.
pub mod search_flags {
    pub const EMBEDDED_OP: u16 = 0x0004;
    pub const FAST_SEARCH: u16 = 0x0010;
    pub const STOP_ON_COUNT: u16 = 0x0020;
    pub const CONTINUOUS: u16 = 0x0040;
    pub const STATUS_REPORT: u16 = 0x0080;
    pub const STATS_REPORT: u16 = 0x0100;
}

/// Side-channel report requests for streaming sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamReports {
    /// Status report field mask (see `read::events`), zero disables.
    pub status: u16,
    /// Stats report field mask, zero disables.
    pub stats: u16,
}

/// One single-protocol search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub timeout_ms: u16,
    /// Wire antenna bytes, `(tx << 4) | rx`.
    pub antennas: Vec<u8>,
    pub metadata: MetadataFlags,
    pub filter: Option<TagFilter>,
    pub tag_op: Option<TagOp>,
    pub access_password: u32,
    pub fast_search: bool,
    pub stop_on_count: Option<u32>,
    /// `Some` for a continuous (streaming) search.
    pub streaming: Option<StreamReports>,
}

impl SearchRequest {
    pub fn new(timeout_ms: u16, metadata: MetadataFlags) -> Self {
        Self {
            timeout_ms,
            antennas: Vec::new(),
            metadata,
            filter: None,
            tag_op: None,
            access_password: 0,
            fast_search: false,
            stop_on_count: None,
            streaming: None,
        }
    }

    fn flags(&self) -> u16 {
        let mut f = 0u16;
        if self.tag_op.is_some() {
            f |= search_flags::EMBEDDED_OP;
        }
        if self.fast_search {
            f |= search_flags::FAST_SEARCH;
        }
        if self.stop_on_count.is_some() {
            f |= search_flags::STOP_ON_COUNT;
        }
        if let Some(reports) = self.streaming {
            f |= search_flags::CONTINUOUS;
            if reports.status != 0 {
                f |= search_flags::STATUS_REPORT;
            }
            if reports.stats != 0 {
                f |= search_flags::STATS_REPORT;
            }
        }
        f
    }

    /// Search arguments (without opcode).
    pub fn encode_args(&self) -> Result<Vec<u8>> {
        if self.antennas.len() > u8::MAX as usize {
            return Err(Error::InvalidArgument("too many antennas in search".into()));
        }
        let flags = self.flags();
        let mut out = vec![SEARCH_OPTIONS];
        out.extend_from_slice(&flags.to_be_bytes());
        out.extend_from_slice(&self.timeout_ms.to_be_bytes());
        out.extend_from_slice(&self.metadata.bits().to_be_bytes());
        out.push(self.antennas.len() as u8);
        out.extend_from_slice(&self.antennas);
        if let Some(n) = self.stop_on_count {
            out.extend_from_slice(&n.to_be_bytes());
        }
        if let Some(reports) = self.streaming {
            if reports.status != 0 {
                out.extend_from_slice(&reports.status.to_be_bytes());
            }
            if reports.stats != 0 {
                out.extend_from_slice(&reports.stats.to_be_bytes());
            }
        }
        out.extend(TagFilter::encode_block(self.filter.as_ref())?);
        if let Some(op) = &self.tag_op {
            out.extend(op.encode_embedded(self.access_password)?);
        }
        Ok(out)
    }
}

pub fn encode_search(req: &SearchRequest) -> Result<Vec<u8>> {
    let mut out = vec![opcode::READ_TAG_ID_MULTIPLE];
    out.extend(req.encode_args()?);
    Ok(out)
}

/// One entry of a multi-protocol search.
#[derive(Debug, Clone)]
pub struct ProtocolSearch {
    pub protocol: TagProtocol,
    pub weight: u16,
    pub search: SearchRequest,
}

/// Several protocol searches dispatched in one command.
#[derive(Debug, Clone)]
pub struct MultiSearchRequest {
    pub timeout_ms: u16,
    pub metadata: MetadataFlags,
    pub streaming: Option<StreamReports>,
    pub entries: Vec<ProtocolSearch>,
}

pub fn encode_multi_search(req: &MultiSearchRequest) -> Result<Vec<u8>> {
    if req.entries.is_empty() || req.entries.len() > u8::MAX as usize {
        return Err(Error::InvalidArgument(format!(
            "multi-protocol search needs 1..=255 entries, got {}",
            req.entries.len()
        )));
    }
    let mut flags = 0u16;
    if let Some(reports) = req.streaming {
        flags |= search_flags::CONTINUOUS;
        if reports.status != 0 {
            flags |= search_flags::STATUS_REPORT;
        }
        if reports.stats != 0 {
            flags |= search_flags::STATS_REPORT;
        }
    }

    let mut out = vec![opcode::MULTI_PROTOCOL_TAG_OP];
    out.extend_from_slice(&req.timeout_ms.to_be_bytes());
    out.push(subcommand::SEARCH);
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(&req.metadata.bits().to_be_bytes());
    out.push(req.entries.len() as u8);
    for entry in &req.entries {
        let sub = entry.search.encode_args()?;
        if sub.len() > u8::MAX as usize {
            return Err(Error::InvalidLength {
                expected: u8::MAX as usize,
                actual: sub.len(),
            });
        }
        out.push(entry.protocol.code());
        out.extend_from_slice(&entry.weight.to_be_bytes());
        out.push(sub.len() as u8);
        out.extend(sub);
    }
    Ok(out)
}

pub fn encode_stop_streaming() -> Vec<u8> {
    vec![
        opcode::MULTI_PROTOCOL_TAG_OP,
        0x00,
        0x00,
        subcommand::STOP_STREAMING,
    ]
}

pub fn encode_auth_response(password: u32) -> Vec<u8> {
    let mut out = vec![
        opcode::MULTI_PROTOCOL_TAG_OP,
        0x00,
        0x00,
        subcommand::AUTH_RESPONSE,
    ];
    out.extend_from_slice(&password.to_be_bytes());
    out
}

/// Fetch (and consume) records from the on-device tag buffer.
pub fn encode_get_tag_buffer(metadata: MetadataFlags) -> Vec<u8> {
    let mut out = vec![opcode::GET_TAG_ID_BUFFER];
    out.extend_from_slice(&metadata.bits().to_be_bytes());
    out.push(0x00);
    out
}

pub fn encode_clear_tag_buffer() -> Vec<u8> {
    vec![opcode::CLEAR_TAG_ID_BUFFER]
}
