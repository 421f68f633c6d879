//! Channel normalization
//!
//! Converts raw channel readings into bounded severity scores:
//! - Angular-rate vector magnitude scaled by a calibration constant (tremor)
//! - Scalar force rescaled to its full-scale value (pressure)
//! - Non-finite readings rejected before they reach either score

use crate::types::{ChannelReading, ForceSample, SensorSample};

/// Tremor score from an angular-rate sample.
///
/// `min(|v| / full_scale, 1.0)`. Callers must reject non-finite samples first
/// (see [`validate_reading`]); the result is still clamped to [0, 1].
pub fn tremor_score(sample: &SensorSample, full_scale: f64) -> f64 {
    (sample.magnitude() / full_scale).clamp(0.0, 1.0)
}

/// Pressure score from a force sample: `force / full_scale`, clamped to [0, 1]
pub fn pressure_score(force: ForceSample, full_scale: f64) -> f64 {
    (force.value() / full_scale).clamp(0.0, 1.0)
}

/// Result of screening one reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValidatedReading {
    pub angular_rate: Option<SensorSample>,
    pub force: Option<ForceSample>,
    /// Number of channels dropped for carrying non-finite values
    pub rejected: u32,
}

/// Drop any channel that carries a NaN or infinite value.
///
/// A rejected channel is treated exactly like a missing one for this tick.
pub fn validate_reading(reading: &ChannelReading) -> ValidatedReading {
    let mut rejected = 0;

    let angular_rate = match reading.angular_rate {
        Some(sample) if sample.is_finite() => Some(sample),
        Some(_) => {
            rejected += 1;
            None
        }
        None => None,
    };

    let force = match reading.force {
        Some(force) if force.value().is_finite() => Some(force),
        Some(_) => {
            rejected += 1;
            None
        }
        None => None,
    };

    ValidatedReading {
        angular_rate,
        force,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tremor_score_scaling() {
        // 30 deg/s with K=100 is 0.30
        let score = tremor_score(&SensorSample::new(30.0, 0.0, 0.0), 100.0);
        assert!((score - 0.30).abs() < 1e-12);

        // 3-4-12 triangle -> magnitude 13
        let score = tremor_score(&SensorSample::new(3.0, 4.0, 12.0), 100.0);
        assert!((score - 0.13).abs() < 1e-12);
    }

    #[test]
    fn test_tremor_score_saturates_at_full_scale() {
        assert_eq!(tremor_score(&SensorSample::new(100.0, 0.0, 0.0), 100.0), 1.0);
        assert_eq!(tremor_score(&SensorSample::new(60.0, 80.0, 0.0), 100.0), 1.0);
        assert_eq!(tremor_score(&SensorSample::new(-5_000.0, 1e6, 3.0), 100.0), 1.0);

        // Just under full scale stays below 1
        assert!(tremor_score(&SensorSample::new(99.9, 0.0, 0.0), 100.0) < 1.0);
    }

    #[test]
    fn test_tremor_score_bounded_for_assorted_inputs() {
        let inputs = [-1e9, -250.0, -30.0, -0.5, 0.0, 0.5, 30.0, 250.0, 1e9];
        for &x in &inputs {
            for &y in &inputs {
                for &z in &inputs {
                    let sample = SensorSample::new(x, y, z);
                    let score = tremor_score(&sample, 100.0);
                    assert!((0.0..=1.0).contains(&score));
                    assert_eq!(score == 1.0, sample.magnitude() >= 100.0);
                }
            }
        }
    }

    #[test]
    fn test_pressure_score() {
        assert!((pressure_score(ForceSample(85.0), 100.0) - 0.85).abs() < 1e-12);
        assert_eq!(pressure_score(ForceSample(0.0), 100.0), 0.0);
        assert_eq!(pressure_score(ForceSample(150.0), 100.0), 1.0);
        assert_eq!(pressure_score(ForceSample(-10.0), 100.0), 0.0);
    }

    #[test]
    fn test_validate_passes_finite_reading() {
        let reading = ChannelReading::new(SensorSample::new(1.0, 2.0, 3.0), ForceSample(40.0));
        let validated = validate_reading(&reading);
        assert_eq!(validated.angular_rate, reading.angular_rate);
        assert_eq!(validated.force, reading.force);
        assert_eq!(validated.rejected, 0);
    }

    #[test]
    fn test_validate_rejects_non_finite_per_channel() {
        let reading = ChannelReading::new(SensorSample::new(f64::NAN, 0.0, 0.0), ForceSample(40.0));
        let validated = validate_reading(&reading);
        assert_eq!(validated.angular_rate, None);
        assert_eq!(validated.force, Some(ForceSample(40.0)));
        assert_eq!(validated.rejected, 1);

        let reading = ChannelReading::new(
            SensorSample::new(0.0, 0.0, 1.0),
            ForceSample(f64::NEG_INFINITY),
        );
        let validated = validate_reading(&reading);
        assert!(validated.angular_rate.is_some());
        assert_eq!(validated.force, None);
        assert_eq!(validated.rejected, 1);
    }

    #[test]
    fn test_validate_missing_channels_not_counted_as_rejected() {
        let validated = validate_reading(&ChannelReading::default());
        assert_eq!(validated, ValidatedReading::default());
    }
}
