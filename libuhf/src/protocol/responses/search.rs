// libuhf-rs/libuhf/src/protocol/responses/search.rs

use crate::protocol::commands::search_flags;
use crate::protocol::parser::Cursor;
use crate::tag::MetadataFlags;
use crate::Result;

/// Embedded tag-operation counters returned with a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbeddedCounts {
    pub succeeded: u16,
    pub failed: u16,
}

/// Summary of one completed search command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchSummary {
    pub tag_count: u32,
    pub embedded: Option<EmbeddedCounts>,
}

/// `[options|subcommand][flags u16][count u32]` optionally followed by
/// `[succeeded u16][failed u16]` when the embedded-op flag is echoed.
pub fn decode_search(data: &[u8]) -> Result<SearchSummary> {
    let mut c = Cursor::new(data);
    c.skip(1)?;
    let flags = c.u16()?;
    let tag_count = c.u32()?;
    let embedded = if flags & search_flags::EMBEDDED_OP != 0 {
        Some(EmbeddedCounts {
            succeeded: c.u16()?,
            failed: c.u16()?,
        })
    } else {
        None
    };
    Ok(SearchSummary {
        tag_count,
        embedded,
    })
}

/// Raw tag-buffer page, parsed into records by the tag parser once the
/// antenna map and protocol context are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBufferChunk {
    pub metadata: MetadataFlags,
    pub count: u8,
    pub records: Vec<u8>,
}

/// `[metadata u16][options][count][records...]`
pub fn decode_tag_buffer(data: &[u8]) -> Result<TagBufferChunk> {
    let mut c = Cursor::new(data);
    let metadata = MetadataFlags::from_bits(c.u16()?)?;
    c.skip(1)?;
    let count = c.u8()?;
    Ok(TagBufferChunk {
        metadata,
        count,
        records: c.rest().to_vec(),
    })
}
