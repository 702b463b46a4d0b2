// libuhf-rs/libuhf/src/utils/timeout.rs
//! Deadline arithmetic for searches whose logical timeout can exceed what
//! one wire command accepts.

use std::time::{Duration, Instant};

use crate::constants::MAX_WIRE_TIMEOUT_MS;

/// Default command timeout in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Fixed point in time a multi-step operation must finish by.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    end: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Next per-command wire timeout: what is left, capped at the largest
    /// value a single search accepts.
    pub fn next_wire_timeout_ms(&self) -> u16 {
        wire_timeout_ms(self.remaining())
    }
}

/// Clamp a duration to the 16-bit millisecond field used on the wire.
pub fn wire_timeout_ms(d: Duration) -> u16 {
    let ms = d.as_millis().min(MAX_WIRE_TIMEOUT_MS as u128);
    ms as u16
}
