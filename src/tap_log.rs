//! Tap event retention
//!
//! Holds the trailing window of tap timestamps used for rate estimation. The
//! window is anchored to the newest tap: eviction runs only when a tap is
//! recorded, so a pause leaves stale entries in place until the next tap.

use crate::config::DEFAULT_TAP_WINDOW_MS;
use crate::types::TimestampMs;
use std::collections::VecDeque;
use tracing::warn;

/// Rolling log of tap timestamps ordered by arrival
#[derive(Debug, Clone)]
pub struct TapEventLog {
    /// Retained tap timestamps, oldest first
    taps: VecDeque<TimestampMs>,
    /// Retention window in milliseconds
    window_ms: u64,
}

impl Default for TapEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_WINDOW_MS)
    }
}

impl TapEventLog {
    /// Create an empty log retaining taps for `window_ms`
    pub fn new(window_ms: u64) -> Self {
        Self {
            taps: VecDeque::new(),
            window_ms,
        }
    }

    /// Append a tap, then evict every tap at least `window_ms` older than it.
    ///
    /// Returns `false` and leaves the log untouched when `timestamp` precedes
    /// the newest retained tap.
    pub fn record(&mut self, timestamp: TimestampMs) -> bool {
        if let Some(&newest) = self.taps.back() {
            if timestamp < newest {
                warn!(timestamp, newest, "rejecting out-of-order tap event");
                return false;
            }
        }

        self.taps.push_back(timestamp);
        while let Some(&oldest) = self.taps.front() {
            if timestamp - oldest >= self.window_ms {
                self.taps.pop_front();
            } else {
                break;
            }
        }
        true
    }

    /// Retained timestamps, oldest first
    pub fn snapshot(&self) -> Vec<TimestampMs> {
        self.taps.iter().copied().collect()
    }

    /// Number of taps in the window
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_eviction_anchored_to_newest_tap() {
        let t0 = 50_000;
        let mut log = TapEventLog::new(10_000);
        log.record(t0);
        log.record(t0 + 1_000);
        log.record(t0 + 9_999);
        assert_eq!(log.len(), 3);

        log.record(t0 + 10_001);
        assert_eq!(
            log.snapshot(),
            vec![t0 + 1_000, t0 + 9_999, t0 + 10_001]
        );
    }

    #[test]
    fn test_age_equal_to_window_is_evicted() {
        let mut log = TapEventLog::new(10_000);
        log.record(0);
        log.record(10_000);
        assert_eq!(log.snapshot(), vec![10_000]);
    }

    #[test]
    fn test_pause_does_not_evict_without_new_tap() {
        let mut log = TapEventLog::new(10_000);
        log.record(0);
        log.record(200);

        // No new taps: both stay regardless of how much time passes
        assert_eq!(log.len(), 2);

        // The next tap after a long pause clears everything older
        log.record(60_000);
        assert_eq!(log.snapshot(), vec![60_000]);
    }

    #[test]
    fn test_out_of_order_tap_rejected() {
        let mut log = TapEventLog::new(10_000);
        assert!(log.record(500));
        assert!(!log.record(400));
        assert_eq!(log.snapshot(), vec![500]);

        // Equal timestamps are accepted
        assert!(log.record(500));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut log = TapEventLog::default();
        log.record(1);
        log.record(2);
        let first = log.snapshot();
        let second = log.snapshot();
        assert_eq!(first, second);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_default_window() {
        let log = TapEventLog::default();
        assert!(log.is_empty());
        assert_eq!(log.window_ms(), DEFAULT_TAP_WINDOW_MS);
    }
}
