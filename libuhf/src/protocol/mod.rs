// libuhf-rs/libuhf/src/protocol/mod.rs

pub mod commands;
pub mod crc;
pub mod filter;
pub mod frame;
pub mod parser;
pub mod responses;
pub mod settings;
pub mod status;
pub mod tagop;

pub use commands::*;
pub use crc::crc16;
pub use filter::TagFilter;
pub use frame::{CrcMode, Frame, read_frame, read_frame_polled};
pub use responses::*;
pub use status::{Fault, FaultCode};
pub use tagop::{CustomTagOp, TagOp, TagOpResult};
