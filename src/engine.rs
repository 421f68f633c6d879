//! Metric engine
//!
//! Owns the current channel readings and the three published severity scores.
//! Two events drive it:
//!
//! - `on_tick()` pulls a reading from the sampler and recomputes all scores
//! - `on_tap_event()` appends a tap to the log; the next tick picks it up
//!
//! The tap log is the only state shared across threads. It sits behind a single
//! mutex, so a tap recorded before a tick starts is visible to that tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{EngineConfig, TremorTiming};
use crate::error::FluxError;
use crate::normalizer::{pressure_score, tremor_score, validate_reading};
use crate::rate;
use crate::sampler::{ChannelSampler, SyntheticSampler};
use crate::tap_log::TapEventLog;
use crate::types::{ForceSample, MetricSnapshot, SensorSample, SeverityScores, TimestampMs};

/// Cloneable handle for recording taps from any thread
#[derive(Clone)]
pub struct TapTrigger {
    tap_log: Arc<Mutex<TapEventLog>>,
    clock: Arc<dyn Clock>,
}

impl TapTrigger {
    /// Record a tap at the current clock time
    pub fn tap(&self) -> bool {
        let mut log = lock_log(&self.tap_log);
        log.record(self.clock.now_ms())
    }

    /// Record a tap at an explicit timestamp
    pub fn tap_at(&self, timestamp: TimestampMs) -> bool {
        lock_log(&self.tap_log).record(timestamp)
    }

    /// Number of taps currently in the window
    pub fn tap_count(&self) -> usize {
        lock_log(&self.tap_log).len()
    }
}

/// A panic while the log is held cannot leave it half-updated, so a poisoned
/// lock is still safe to use
fn lock_log(tap_log: &Mutex<TapEventLog>) -> MutexGuard<'_, TapEventLog> {
    tap_log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tick-driven severity score engine
pub struct MetricEngine {
    config: EngineConfig,
    sampler: Box<dyn ChannelSampler>,
    clock: Arc<dyn Clock>,
    tap_log: Arc<Mutex<TapEventLog>>,

    angular_rate: SensorSample,
    force: ForceSample,
    scores: SeverityScores,
    taps_per_second: Option<f64>,

    ticks_applied: u64,
    ticks_dropped: u64,
    rejected_readings: u64,
}

impl MetricEngine {
    /// Create an engine timestamping taps with a monotonic clock
    pub fn new(
        config: EngineConfig,
        sampler: impl ChannelSampler + 'static,
    ) -> Result<Self, FluxError> {
        Self::with_clock(config, sampler, Arc::new(MonotonicClock::new()))
    }

    /// Create an engine fed by the synthetic generator
    pub fn synthetic(config: EngineConfig, seed: Option<u64>) -> Result<Self, FluxError> {
        let sampler = match seed {
            Some(seed) => SyntheticSampler::with_seed(config.tick_period_ms, seed),
            None => SyntheticSampler::new(config.tick_period_ms),
        };
        Self::new(config, sampler)
    }

    /// Create an engine with an explicit clock
    pub fn with_clock(
        config: EngineConfig,
        sampler: impl ChannelSampler + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FluxError> {
        config.validate()?;
        info!(
            tick_period_ms = config.tick_period_ms,
            tap_window_ms = config.tap_window_ms,
            timing = ?config.tremor_timing,
            "metric engine initialized"
        );

        Ok(Self {
            tap_log: Arc::new(Mutex::new(TapEventLog::new(config.tap_window_ms))),
            sampler: Box::new(sampler),
            clock,
            angular_rate: SensorSample::default(),
            force: ForceSample(config.initial_force),
            scores: SeverityScores::default(),
            taps_per_second: None,
            ticks_applied: 0,
            ticks_dropped: 0,
            rejected_readings: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one tick: sample, then recompute tremor, pressure and tapping.
    ///
    /// Missing or non-finite channels keep their previous reading; a tapping
    /// window without enough data keeps the previous tapping score.
    pub fn on_tick(&mut self) -> MetricSnapshot {
        let held_rate = self.angular_rate;
        self.apply_sample();

        let tremor_source = match self.config.tremor_timing {
            TremorTiming::Fresh => self.angular_rate,
            TremorTiming::LaggedOneTick => held_rate,
        };
        self.scores.tremor = tremor_score(&tremor_source, self.config.tremor_full_scale);
        self.scores.pressure = pressure_score(self.force, self.config.force_full_scale);

        let taps = lock_log(&self.tap_log).snapshot();
        match rate::estimate(&taps, self.config.target_tap_rate_hz) {
            Some(estimate) => {
                self.scores.tapping = estimate.score;
                self.taps_per_second = Some(estimate.taps_per_second);
            }
            None => trace!(taps = taps.len(), "insufficient tap data, holding tapping score"),
        }

        self.ticks_applied += 1;
        trace!(
            tick = self.ticks_applied,
            tremor = self.scores.tremor,
            pressure = self.scores.pressure,
            tapping = self.scores.tapping,
            "tick applied"
        );
        self.snapshot()
    }

    fn apply_sample(&mut self) {
        let Some(reading) = self.sampler.sample() else {
            debug!("no sample this tick, holding previous readings");
            return;
        };

        let validated = validate_reading(&reading);
        if validated.rejected > 0 {
            self.rejected_readings += u64::from(validated.rejected);
            warn!(
                rejected = validated.rejected,
                "non-finite channel value rejected, holding previous reading"
            );
        }

        match validated.angular_rate {
            Some(sample) => self.angular_rate = sample,
            None => debug!("angular-rate channel empty this tick"),
        }
        match validated.force {
            Some(force) => self.force = force,
            None => debug!("force channel empty this tick"),
        }
    }

    /// Record a tap at the current clock time. Scores update on the next tick.
    pub fn on_tap_event(&self) -> bool {
        let mut log = lock_log(&self.tap_log);
        log.record(self.clock.now_ms())
    }

    /// Record a tap at an explicit timestamp
    pub fn record_tap_at(&self, timestamp: TimestampMs) -> bool {
        lock_log(&self.tap_log).record(timestamp)
    }

    /// Handle for recording taps from another thread
    pub fn tap_trigger(&self) -> TapTrigger {
        TapTrigger {
            tap_log: Arc::clone(&self.tap_log),
            clock: Arc::clone(&self.clock),
        }
    }

    /// Account for ticks the tick source could not run. Scores are untouched.
    pub fn skip_ticks(&mut self, count: u64) {
        if count == 0 {
            return;
        }
        self.ticks_dropped += count;
        warn!(
            dropped = count,
            total_dropped = self.ticks_dropped,
            "ticks dropped, last scores retained"
        );
    }

    /// Current readings and scores
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            angular_rate: self.angular_rate,
            force: self.force,
            tap_count: lock_log(&self.tap_log).len(),
            scores: self.scores,
            taps_per_second: self.taps_per_second,
            ticks_applied: self.ticks_applied,
            ticks_dropped: self.ticks_dropped,
            rejected_readings: self.rejected_readings,
        }
    }

    pub fn scores(&self) -> SeverityScores {
        self.scores
    }
}
