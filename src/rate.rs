//! Tapping rate estimation
//!
//! Turns the retained tap window into a taps/second estimate and a symmetric
//! deviation score against the target rhythm.

use crate::config::DEFAULT_TARGET_TAP_RATE_HZ;
use crate::types::TimestampMs;
use serde::{Deserialize, Serialize};

/// Rate estimate over one tap window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Mean inter-tap interval in milliseconds
    pub mean_interval_ms: f64,
    /// Estimated tapping rate
    pub taps_per_second: f64,
    /// Deviation score in [0, 1]
    pub score: f64,
}

/// Estimate tapping rate from ordered tap timestamps.
///
/// Averages every consecutive interval in the window, so the estimate trails
/// rate changes by up to one window. Returns `None` (insufficient data) with
/// fewer than two taps or when the mean interval is zero.
pub fn estimate(timestamps: &[TimestampMs], target_hz: f64) -> Option<RateEstimate> {
    if timestamps.len() < 2 {
        return None;
    }

    let intervals: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) as f64)
        .collect();
    let mean_interval_ms = intervals.iter().sum::<f64>() / intervals.len() as f64;

    if mean_interval_ms <= 0.0 {
        return None;
    }

    let taps_per_second = 1000.0 / mean_interval_ms;
    Some(RateEstimate {
        mean_interval_ms,
        taps_per_second,
        score: deviation_score(taps_per_second, target_hz),
    })
}

/// Estimate against the default 5 taps/second target
pub fn estimate_default(timestamps: &[TimestampMs]) -> Option<RateEstimate> {
    estimate(timestamps, DEFAULT_TARGET_TAP_RATE_HZ)
}

/// Relative deviation from target: `min(|rate - target| / target, 1.0)`.
///
/// Too fast and too slow score the same for the same absolute deviation.
pub fn deviation_score(taps_per_second: f64, target_hz: f64) -> f64 {
    ((taps_per_second - target_hz).abs() / target_hz).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evenly_spaced(count: u64, span_ms: u64) -> Vec<TimestampMs> {
        (0..count).map(|i| i * span_ms / (count - 1)).collect()
    }

    #[test]
    fn test_on_target_rhythm_scores_zero() {
        let taps = [0, 200, 400, 600, 800];
        let estimate = estimate_default(&taps).unwrap();
        assert!((estimate.mean_interval_ms - 200.0).abs() < 1e-12);
        assert!((estimate.taps_per_second - 5.0).abs() < 1e-12);
        assert_eq!(estimate.score, 0.0);
    }

    #[test]
    fn test_symmetric_deviation() {
        // 3 taps/s and 7 taps/s are both 2 taps/s off target
        let slow = estimate_default(&evenly_spaced(4, 1000)).unwrap();
        let fast = estimate_default(&evenly_spaced(8, 1000)).unwrap();
        assert!((slow.taps_per_second - 3.0).abs() < 1e-6);
        assert!((fast.taps_per_second - 7.0).abs() < 1e-6);
        assert!((slow.score - fast.score).abs() < 1e-9);
        assert!((slow.score - 0.4).abs() < 1e-6);

        // 4 and 6 taps/s
        let slow = estimate_default(&evenly_spaced(5, 1000)).unwrap();
        let fast = estimate_default(&evenly_spaced(7, 1000)).unwrap();
        assert!((slow.score - fast.score).abs() < 1e-9);
        assert!((slow.score - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_far_off_target_saturates() {
        // 10 taps/s is 100% above target
        let fast = estimate_default(&[0, 100, 200, 300]).unwrap();
        assert_eq!(fast.score, 1.0);

        // 0.5 taps/s
        let slow = estimate_default(&[0, 2000, 4000]).unwrap();
        assert!((slow.score - 0.9).abs() < 1e-12);

        // 20 taps/s is clamped
        let very_fast = estimate_default(&[0, 50, 100]).unwrap();
        assert_eq!(very_fast.score, 1.0);
    }

    #[test]
    fn test_single_tap_is_insufficient() {
        assert_eq!(estimate_default(&[1234]), None);
        assert_eq!(estimate_default(&[]), None);
    }

    #[test]
    fn test_zero_interval_is_insufficient() {
        assert_eq!(estimate_default(&[500, 500]), None);
        assert_eq!(estimate_default(&[500, 500, 500]), None);
    }

    #[test]
    fn test_average_spans_whole_window() {
        // Intervals 100 and 300 average to 200 -> on target
        let estimate = estimate_default(&[0, 100, 400]).unwrap();
        assert!((estimate.mean_interval_ms - 200.0).abs() < 1e-12);
        assert_eq!(estimate.score, 0.0);
    }

    #[test]
    fn test_custom_target() {
        let estimate = estimate(&[0, 500, 1000], 2.0).unwrap();
        assert_eq!(estimate.score, 0.0);
    }
}
