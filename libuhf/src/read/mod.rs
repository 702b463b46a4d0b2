// libuhf-rs/libuhf/src/read/mod.rs
//! Reading tags: plans, timed reads, streaming sessions.

pub mod dedup;
pub mod events;
pub mod plan;
pub mod stream;
pub mod sync;

pub use dedup::{DedupKey, DedupPolicy, fold};
pub use events::{ReadEvent, ReaderStats, StatusReport};
pub use plan::{MultiReadPlan, ReadPlan, SimpleReadPlan, StopTriggerReadPlan};
pub use stream::{AuthCallback, StreamConfig, StreamMode, StreamState, StreamingReadEngine};
pub use sync::{DEFAULT_METADATA, ReadCounters, ReadOptions, SyncReadEngine};
