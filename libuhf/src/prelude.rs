// libuhf-rs/libuhf/src/prelude.rs

pub use crate::antenna::{AntennaMap, AntennaPort};
pub use crate::params::{MemoryParams, ParamStore, ParamValue, keys};
pub use crate::protocol::{Command, Fault, Response, TagFilter, TagOp, TagOpResult};
pub use crate::read::{
    AuthCallback, MultiReadPlan, ReadEvent, ReadPlan, ReaderStats, SimpleReadPlan, StatusReport,
    StopTriggerReadPlan,
};
pub use crate::reader::{Connected, Disconnected, Reader, ReaderBuilder};
pub use crate::tag::{MetadataFlags, TagReadRecord};
pub use crate::transport::{MockTransport, Transport};
#[cfg(feature = "serial")]
pub use crate::transport::SerialTransport;
pub use crate::{
    Epc, Error, ErrorKind, MemoryBank, ModelFamily, PowerMode, ProductGroup, Region, Result,
    TagProtocol, VersionInfo,
};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, ms, parse_hex};
