//! Severity zone classification
//!
//! Maps any severity score onto five ordered zones using fixed half-open
//! thresholds. The same partition applies to all three scores.
//!
//! ```text
//! [0.00, 0.30)  Safe     #22c55e
//! [0.30, 0.50)  Normal   #84cc16
//! [0.50, 0.70)  Monitor  #eab308
//! [0.70, 0.85)  Caution  #f97316
//! [0.85, 1.00]  Alert    #ef4444
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bounds of the Normal, Monitor, Caution and Alert zones
pub const ZONE_THRESHOLDS: [f64; 4] = [0.3, 0.5, 0.7, 0.85];

/// Ordered severity zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Safe,
    Normal,
    Monitor,
    Caution,
    Alert,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Safe,
        Zone::Normal,
        Zone::Monitor,
        Zone::Caution,
        Zone::Alert,
    ];

    /// Classify a score.
    ///
    /// Boundary values belong to the upper zone. Scores below 0 land in Safe;
    /// scores above 1 and NaN fall through to Alert.
    pub fn classify(score: f64) -> Zone {
        if score < ZONE_THRESHOLDS[0] {
            Zone::Safe
        } else if score < ZONE_THRESHOLDS[1] {
            Zone::Normal
        } else if score < ZONE_THRESHOLDS[2] {
            Zone::Monitor
        } else if score < ZONE_THRESHOLDS[3] {
            Zone::Caution
        } else {
            Zone::Alert
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Safe => "Safe",
            Zone::Normal => "Normal",
            Zone::Monitor => "Monitor",
            Zone::Caution => "Caution",
            Zone::Alert => "Alert",
        }
    }

    /// Display color as a hex RGB string
    pub fn color(&self) -> &'static str {
        match self {
            Zone::Safe => "#22c55e",
            Zone::Normal => "#84cc16",
            Zone::Monitor => "#eab308",
            Zone::Caution => "#f97316",
            Zone::Alert => "#ef4444",
        }
    }

    /// Score range covered by the zone as `(lower, upper)`; upper is exclusive
    /// except for Alert
    pub fn range(&self) -> (f64, f64) {
        match self {
            Zone::Safe => (0.0, ZONE_THRESHOLDS[0]),
            Zone::Normal => (ZONE_THRESHOLDS[0], ZONE_THRESHOLDS[1]),
            Zone::Monitor => (ZONE_THRESHOLDS[1], ZONE_THRESHOLDS[2]),
            Zone::Caution => (ZONE_THRESHOLDS[2], ZONE_THRESHOLDS[3]),
            Zone::Alert => (ZONE_THRESHOLDS[3], 1.0),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a score into its zone and display color
pub fn zone(score: f64) -> (Zone, &'static str) {
    let zone = Zone::classify(score);
    (zone, zone.color())
}

/// Coarse overall assessment.
///
/// Driven by the tremor score alone; pressure and tapping do not move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Normal,
    MonitorRequired,
    ConsultDoctor,
}

impl Assessment {
    pub fn from_tremor(tremor: f64) -> Assessment {
        if tremor < 0.3 {
            Assessment::Normal
        } else if tremor < 0.7 {
            Assessment::MonitorRequired
        } else {
            Assessment::ConsultDoctor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Assessment::Normal => "Normal",
            Assessment::MonitorRequired => "Monitor Required",
            Assessment::ConsultDoctor => "Consult Doctor",
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
