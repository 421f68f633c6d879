//! Fixed-period tick loop
//!
//! Runs a [`MetricEngine`] on a worker thread at the configured tick period.
//! When the worker falls a whole period or more behind, the missed ticks are
//! dropped instead of replayed back to back, so each dropped tick skips one
//! score update and the last good scores stay published.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::engine::{MetricEngine, TapTrigger};
use crate::error::FluxError;
use crate::types::MetricSnapshot;

/// Deadline bookkeeping for a fixed-period tick source.
///
/// Times are milliseconds since the schedule's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    period_ms: u64,
    next_due_ms: u64,
}

impl TickSchedule {
    /// First tick is due one period after the origin
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            next_due_ms: period_ms,
        }
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Called when a tick runs at `now_ms`. Advances the deadline and returns
    /// how many ticks were missed since the previous deadline.
    pub fn complete_tick(&mut self, now_ms: u64) -> u64 {
        let overdue = now_ms.saturating_sub(self.next_due_ms);
        let missed = overdue / self.period_ms;
        self.next_due_ms += (missed + 1) * self.period_ms;
        missed
    }
}

/// Tick loop running on its own thread
pub struct TickLoop {
    handle: Option<JoinHandle<MetricEngine>>,
    stop: Arc<AtomicBool>,
    latest: Arc<RwLock<MetricSnapshot>>,
    trigger: TapTrigger,
}

impl TickLoop {
    /// Start ticking `engine` until stopped
    pub fn spawn(engine: MetricEngine) -> Result<Self, FluxError> {
        Self::spawn_with_observer(engine, None, |_| {})
    }

    /// Start ticking, calling `observer` with every applied snapshot.
    ///
    /// With `max_ticks` set, the loop ends by itself after that many applied
    /// ticks.
    pub fn spawn_with_observer<F>(
        mut engine: MetricEngine,
        max_ticks: Option<u64>,
        mut observer: F,
    ) -> Result<Self, FluxError>
    where
        F: FnMut(&MetricSnapshot) + Send + 'static,
    {
        let period_ms = engine.config().tick_period_ms;
        let stop = Arc::new(AtomicBool::new(false));
        let latest = Arc::new(RwLock::new(engine.snapshot()));
        let trigger = engine.tap_trigger();

        let worker_stop = Arc::clone(&stop);
        let worker_latest = Arc::clone(&latest);
        let handle = thread::Builder::new()
            .name("flux-tick".to_string())
            .spawn(move || {
                info!(period_ms, "tick loop started");
                let origin = Instant::now();
                let mut schedule = TickSchedule::new(period_ms);
                let mut applied = 0u64;

                while !worker_stop.load(Ordering::Acquire) {
                    let due = Duration::from_millis(schedule.next_due_ms());
                    if let Some(wait) = due.checked_sub(origin.elapsed()) {
                        thread::sleep(wait);
                    }
                    if worker_stop.load(Ordering::Acquire) {
                        break;
                    }

                    let now_ms = origin.elapsed().as_millis() as u64;
                    let missed = schedule.complete_tick(now_ms);
                    if missed > 0 {
                        warn!(missed, "tick loop fell behind");
                        engine.skip_ticks(missed);
                    }

                    let snapshot = engine.on_tick();
                    *worker_latest
                        .write()
                        .unwrap_or_else(PoisonError::into_inner) = snapshot;
                    observer(&snapshot);

                    applied += 1;
                    if max_ticks.is_some_and(|max| applied >= max) {
                        break;
                    }
                }

                info!(applied, "tick loop stopped");
                engine
            })?;

        Ok(Self {
            handle: Some(handle),
            stop,
            latest,
            trigger,
        })
    }

    /// Record a tap at the current clock time
    pub fn tap(&self) -> bool {
        self.trigger.tap()
    }

    /// Handle for recording taps from other threads
    pub fn tap_trigger(&self) -> TapTrigger {
        self.trigger.clone()
    }

    /// Snapshot published by the most recent tick
    pub fn latest(&self) -> MetricSnapshot {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once the worker has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the worker and hand back the engine
    pub fn stop(mut self) -> Option<MetricEngine> {
        self.stop.store(true, Ordering::Release);
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
