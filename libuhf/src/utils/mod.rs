//! Small, reusable helpers: hex formatting for traces and EPCs, and deadline
//! arithmetic for chopped search timeouts.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
