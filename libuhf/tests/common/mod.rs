// Shared helpers for the integration test crates.
#![allow(dead_code)]

pub mod fixtures;

pub use libuhf::test_support::*;

/// Route `log` output through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
