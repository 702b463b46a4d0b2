// libuhf-rs/libuhf/src/tag/mod.rs

pub mod metadata;
pub mod parser;
pub mod record;

pub use metadata::MetadataFlags;
pub use parser::{ParseContext, parse_record, parse_records, parse_stream_record};
pub use record::TagReadRecord;
