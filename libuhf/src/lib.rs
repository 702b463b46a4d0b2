// libuhf-rs/libuhf/src/lib.rs

//! libuhf
//!
//! Pure Rust host driver for serial UHF RFID reader modules.
#![warn(missing_docs)]

pub mod antenna;
pub mod constants;
pub mod error;
pub mod params;
pub mod prelude;
pub mod protocol;
pub mod read;
pub mod reader;
pub mod tag;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the value types in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
