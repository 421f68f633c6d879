//! Monotonic millisecond clocks used to timestamp tap events

use crate::types::TimestampMs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of monotonic timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin; never decreases
    fn now_ms(&self) -> TimestampMs;
}

/// Wall-independent clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimestampMs {
        self.origin.elapsed().as_millis() as TimestampMs
    }
}

/// Manually advanced clock for tests and replay
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: TimestampMs) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock to `ms`; earlier values are ignored
    pub fn set(&self, ms: TimestampMs) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}
