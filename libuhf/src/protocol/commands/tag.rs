// libuhf-rs/libuhf/src/protocol/commands/tag.rs

use crate::protocol::filter::TagFilter;
use crate::protocol::tagop::TagOp;
use crate::Result;

/// Standalone tag operation against the first tag matching `filter`.
pub fn encode_tag_op(
    op: &TagOp,
    timeout_ms: u16,
    password: u32,
    filter: Option<&TagFilter>,
) -> Result<Vec<u8>> {
    let filter_block = TagFilter::encode_block(filter)?;
    let mut out = vec![op.opcode()];
    out.extend(op.encode_standalone(timeout_ms, password, &filter_block)?);
    Ok(out)
}
