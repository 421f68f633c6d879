//! Core types for the motor-flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw channel readings, severity scores, and the published snapshot
//! read by presentation-layer consumers.

use serde::{Deserialize, Serialize};

/// Monotonic timestamp in milliseconds
pub type TimestampMs = u64;

/// Triaxial angular-rate reading (degrees/second)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SensorSample {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the rate vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Scalar force reading in sensor units (nominal range 0-100)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForceSample(pub f64);

impl ForceSample {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// One tick's worth of channel data.
///
/// A channel left as `None` had no sample available this tick; the engine holds
/// its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelReading {
    #[serde(default)]
    pub angular_rate: Option<SensorSample>,
    #[serde(default)]
    pub force: Option<ForceSample>,
}

impl ChannelReading {
    pub fn new(angular_rate: SensorSample, force: ForceSample) -> Self {
        Self {
            angular_rate: Some(angular_rate),
            force: Some(force),
        }
    }
}

/// Which score a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Tremor,
    Pressure,
    Tapping,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Tremor, MetricKind::Pressure, MetricKind::Tapping];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Tremor => "tremor",
            MetricKind::Pressure => "pressure",
            MetricKind::Tapping => "tapping",
        }
    }

    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Tremor => "Tremor Intensity",
            MetricKind::Pressure => "Grip Pressure",
            MetricKind::Tapping => "Tapping Rhythm",
        }
    }
}

/// The three published severity scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityScores {
    pub tremor: f64,
    pub pressure: f64,
    pub tapping: f64,
}

impl SeverityScores {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Tremor => self.tremor,
            MetricKind::Pressure => self.pressure,
            MetricKind::Tapping => self.tapping,
        }
    }
}

/// Read-only view of the engine state handed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Current angular-rate sample
    pub angular_rate: SensorSample,
    /// Current force sample
    pub force: ForceSample,
    /// Number of tap events inside the retention window
    pub tap_count: usize,
    /// Published severity scores
    pub scores: SeverityScores,
    /// Rate estimate behind the current tapping score, if any
    pub taps_per_second: Option<f64>,
    /// Ticks that ran a score update
    pub ticks_applied: u64,
    /// Ticks skipped because the tick source fell behind
    pub ticks_dropped: u64,
    /// Channel values rejected as non-finite
    pub rejected_readings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_sample_magnitude() {
        let sample = SensorSample::new(3.0, 4.0, 12.0);
        assert!((sample.magnitude() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_sensor_sample_finite_check() {
        assert!(SensorSample::new(1.0, -2.0, 0.0).is_finite());
        assert!(!SensorSample::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!SensorSample::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_channel_reading_missing_channels_deserialize() {
        let reading: ChannelReading = serde_json::from_str(r#"{"force": 42.5}"#).unwrap();
        assert_eq!(reading.angular_rate, None);
        assert_eq!(reading.force, Some(ForceSample(42.5)));
    }

    #[test]
    fn test_scores_lookup_by_kind() {
        let scores = SeverityScores {
            tremor: 0.1,
            pressure: 0.2,
            tapping: 0.3,
        };
        assert_eq!(scores.get(MetricKind::Tremor), 0.1);
        assert_eq!(scores.get(MetricKind::Pressure), 0.2);
        assert_eq!(scores.get(MetricKind::Tapping), 0.3);
    }
}
