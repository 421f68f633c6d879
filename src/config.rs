//! Engine configuration
//!
//! All calibration constants live here. Every field has a default, so a JSON
//! config file only needs to name the values it overrides.

use crate::error::FluxError;
use serde::{Deserialize, Serialize};

/// Default tick period (milliseconds)
pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;

/// Default tap retention window (milliseconds)
pub const DEFAULT_TAP_WINDOW_MS: u64 = 10_000;

/// Angular-rate magnitude that maps to a tremor score of 1.0 (degrees/second)
pub const DEFAULT_TREMOR_FULL_SCALE: f64 = 100.0;

/// Force reading that maps to a pressure score of 1.0
pub const DEFAULT_FORCE_FULL_SCALE: f64 = 100.0;

/// Designed-normal tapping rhythm (taps/second)
pub const DEFAULT_TARGET_TAP_RATE_HZ: f64 = 5.0;

/// Which angular-rate reading feeds the tremor score on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TremorTiming {
    /// Use the reading sampled on this tick
    #[default]
    Fresh,
    /// Use the reading held before this tick's sample is applied, so tremor
    /// trails the sampled data by one tick
    LaggedOneTick,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick period in milliseconds
    pub tick_period_ms: u64,
    /// Tap retention window in milliseconds
    pub tap_window_ms: u64,
    /// Normalization constant K for tremor
    pub tremor_full_scale: f64,
    /// Full-scale force reading
    pub force_full_scale: f64,
    /// Target tapping rate in taps/second
    pub target_tap_rate_hz: f64,
    /// Tremor sampling alignment
    pub tremor_timing: TremorTiming,
    /// Force value held before the first sample arrives
    pub initial_force: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            tap_window_ms: DEFAULT_TAP_WINDOW_MS,
            tremor_full_scale: DEFAULT_TREMOR_FULL_SCALE,
            force_full_scale: DEFAULT_FORCE_FULL_SCALE,
            target_tap_rate_hz: DEFAULT_TARGET_TAP_RATE_HZ,
            tremor_timing: TremorTiming::Fresh,
            initial_force: 50.0,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from JSON, then validate it
    pub fn from_json(json: &str) -> Result<Self, FluxError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, FluxError> {
        serde_json::to_string_pretty(self).map_err(FluxError::JsonError)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), FluxError> {
        if self.tick_period_ms == 0 {
            return Err(FluxError::InvalidConfig(
                "tick_period_ms must be positive".to_string(),
            ));
        }
        if self.tap_window_ms == 0 {
            return Err(FluxError::InvalidConfig(
                "tap_window_ms must be positive".to_string(),
            ));
        }
        require_positive("tremor_full_scale", self.tremor_full_scale)?;
        require_positive("force_full_scale", self.force_full_scale)?;
        require_positive("target_tap_rate_hz", self.target_tap_rate_hz)?;
        if !self.initial_force.is_finite() {
            return Err(FluxError::InvalidConfig(
                "initial_force must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), FluxError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FluxError::InvalidConfig(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}
