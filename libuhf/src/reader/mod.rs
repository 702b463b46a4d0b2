// libuhf-rs/libuhf/src/reader/mod.rs
//! The reader: wire channel, typed commands, connect sequence and the
//! per-family model table.

pub mod baud;
pub mod builder;
pub mod channel;
pub mod dispatch;
pub mod handle;
pub mod models;

pub use builder::ReaderBuilder;
pub use channel::{Channel, Link};
pub use dispatch::{Dispatcher, SearchOutcome};
pub use handle::{Connected, Disconnected, Reader};
pub use models::{DeviceModel, create_model_for};
