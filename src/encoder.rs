//! Assessment report encoder
//!
//! Renders a metric snapshot and a free-text subject label into a JSON
//! assessment report. The report is a static document: it reads one snapshot
//! and never touches the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FluxError;
use crate::types::{MetricKind, MetricSnapshot, SensorSample};
use crate::zone::{Assessment, Zone};
use crate::{FLUX_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Subject label used when none is given
pub const UNSPECIFIED_SUBJECT: &str = "Not Specified";

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One scored metric with its zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub metric: MetricKind,
    pub label: String,
    pub score: f64,
    /// Score as a whole-number percentage
    pub percent: u32,
    pub zone: Zone,
    pub color: String,
}

/// Raw channel values at report time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSensors {
    /// Angular rate in degrees/second
    pub angular_rate: SensorSample,
    /// Force in sensor units
    pub force: f64,
    /// Taps inside the retention window
    pub tap_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taps_per_second: Option<f64>,
}

/// Overall assessment banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAssessment {
    pub level: Assessment,
    pub label: String,
}

/// Tick bookkeeping at report time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCounters {
    pub ticks_applied: u64,
    pub ticks_dropped: u64,
    pub rejected_readings: u64,
}

/// Complete assessment report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub report_version: String,
    pub report_id: String,
    pub producer: ReportProducer,
    pub subject: String,
    pub generated_at: DateTime<Utc>,
    pub metrics: Vec<MetricReading>,
    pub sensors: ReportSensors,
    pub assessment: ReportAssessment,
    pub counters: ReportCounters,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a report stamped with the current time
    pub fn encode(&self, snapshot: &MetricSnapshot, subject: &str) -> AssessmentReport {
        self.encode_at(snapshot, subject, Utc::now())
    }

    /// Build a report with an explicit generation time
    pub fn encode_at(
        &self,
        snapshot: &MetricSnapshot,
        subject: &str,
        generated_at: DateTime<Utc>,
    ) -> AssessmentReport {
        let subject = subject.trim();
        let subject = if subject.is_empty() {
            UNSPECIFIED_SUBJECT.to_string()
        } else {
            subject.to_string()
        };

        let metrics = MetricKind::ALL
            .iter()
            .map(|&kind| build_reading(kind, snapshot.scores.get(kind)))
            .collect();

        let level = Assessment::from_tremor(snapshot.scores.tremor);

        AssessmentReport {
            report_version: REPORT_VERSION.to_string(),
            report_id: Uuid::new_v4().to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            subject,
            generated_at,
            metrics,
            sensors: ReportSensors {
                angular_rate: snapshot.angular_rate,
                force: snapshot.force.value(),
                tap_count: snapshot.tap_count,
                taps_per_second: snapshot.taps_per_second,
            },
            assessment: ReportAssessment {
                level,
                label: level.label().to_string(),
            },
            counters: ReportCounters {
                ticks_applied: snapshot.ticks_applied,
                ticks_dropped: snapshot.ticks_dropped,
                rejected_readings: snapshot.rejected_readings,
            },
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        snapshot: &MetricSnapshot,
        subject: &str,
    ) -> Result<String, FluxError> {
        let report = self.encode(snapshot, subject);
        serde_json::to_string_pretty(&report).map_err(|e| FluxError::EncodingError(e.to_string()))
    }
}

fn build_reading(kind: MetricKind, score: f64) -> MetricReading {
    let zone = Zone::classify(score);
    MetricReading {
        metric: kind,
        label: kind.label().to_string(),
        score,
        percent: (score.clamp(0.0, 1.0) * 100.0).round() as u32,
        zone,
        color: zone.color().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForceSample, SeverityScores};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn make_snapshot() -> MetricSnapshot {
        MetricSnapshot {
            angular_rate: SensorSample::new(30.0, 0.0, 0.0),
            force: ForceSample(85.0),
            tap_count: 5,
            scores: SeverityScores {
                tremor: 0.30,
                pressure: 0.85,
                tapping: 0.0,
            },
            taps_per_second: Some(5.0),
            ticks_applied: 12,
            ticks_dropped: 1,
            rejected_readings: 0,
        }
    }

    #[test]
    fn test_report_metrics_and_zones() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&make_snapshot(), "Subject A");

        assert_eq!(report.subject, "Subject A");
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.producer.name, PRODUCER_NAME);

        let tremor = &report.metrics[0];
        assert_eq!(tremor.metric, MetricKind::Tremor);
        assert_eq!(tremor.percent, 30);
        assert_eq!(tremor.zone, Zone::Normal);
        assert_eq!(tremor.color, "#84cc16");

        let pressure = &report.metrics[1];
        assert_eq!(pressure.zone, Zone::Alert);
        assert_eq!(pressure.percent, 85);

        let tapping = &report.metrics[2];
        assert_eq!(tapping.zone, Zone::Safe);
        assert_eq!(tapping.label, "Tapping Rhythm");
    }

    #[test]
    fn test_assessment_ignores_pressure_and_tapping() {
        let encoder = ReportEncoder::new();
        let mut snapshot = make_snapshot();
        snapshot.scores = SeverityScores {
            tremor: 0.1,
            pressure: 1.0,
            tapping: 1.0,
        };
        let report = encoder.encode(&snapshot, "");
        assert_eq!(report.assessment.level, Assessment::Normal);
        assert_eq!(report.assessment.label, "Normal");

        snapshot.scores.tremor = 0.3;
        let report = encoder.encode(&snapshot, "");
        assert_eq!(report.assessment.label, "Monitor Required");

        snapshot.scores.tremor = 0.75;
        let report = encoder.encode(&snapshot, "");
        assert_eq!(report.assessment.label, "Consult Doctor");
    }

    #[test]
    fn test_blank_subject_is_unspecified() {
        let encoder = ReportEncoder::new();
        assert_eq!(encoder.encode(&make_snapshot(), "   ").subject, UNSPECIFIED_SUBJECT);
    }

    #[test]
    fn test_report_ids_are_unique() {
        let encoder = ReportEncoder::new();
        let a = encoder.encode(&make_snapshot(), "x");
        let b = encoder.encode(&make_snapshot(), "x");
        assert_ne!(a.report_id, b.report_id);
        assert_eq!(a.producer.instance_id, b.producer.instance_id);
    }

    #[test]
    fn test_report_json_shape() {
        let encoder = ReportEncoder::with_instance_id("fixed".to_string());
        let generated_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let report = encoder.encode_at(&make_snapshot(), "Subject B", generated_at);

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report_version"], REPORT_VERSION);
        assert_eq!(json["generated_at"], "2024-03-01T09:30:00Z");
        assert_eq!(json["metrics"][1]["zone"], "alert");
        assert_eq!(json["sensors"]["angular_rate"]["x"], 30.0);
        assert_eq!(json["sensors"]["force"], 85.0);
        assert_eq!(json["sensors"]["tap_count"], 5);
        assert_eq!(json["assessment"]["level"], "monitor_required");
        assert_eq!(json["counters"]["ticks_dropped"], 1);
    }

    #[test]
    fn test_encode_to_json_parses_back() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(&make_snapshot(), "Subject C").unwrap();
        let report: AssessmentReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.subject, "Subject C");
        assert_eq!(report.metrics.len(), 3);
    }
}
