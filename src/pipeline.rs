//! Pipeline orchestration
//!
//! This module provides the one-shot public API for motor-flux: drive a fresh
//! engine through a recorded session and return its snapshots or a report.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::engine::MetricEngine;
use crate::error::FluxError;
use crate::replay::{parse_replay, ReplayRecord};
use crate::sampler::ScriptedSampler;
use crate::types::MetricSnapshot;

/// Result of replaying a recorded session
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// Snapshot after every applied tick, in order
    pub snapshots: Vec<MetricSnapshot>,
    /// Engine state after the last record
    pub final_snapshot: MetricSnapshot,
    /// Tap records the engine refused as out of order
    pub rejected_taps: usize,
}

/// Replay parsed records through a fresh engine.
///
/// Tick records feed the sampler in order, tap records are applied with their
/// own timestamps, and drop records skip one score update.
pub fn replay(config: EngineConfig, records: &[ReplayRecord]) -> Result<ReplayOutcome, FluxError> {
    let sampler = ScriptedSampler::new(
        records
            .iter()
            .filter(|r| matches!(r, ReplayRecord::Tick { .. }))
            .map(ReplayRecord::reading),
    );
    let mut engine = MetricEngine::with_clock(config, sampler, Arc::new(ManualClock::default()))?;

    let mut snapshots = Vec::new();
    let mut rejected_taps = 0;

    for record in records {
        match *record {
            ReplayRecord::Tick { .. } => snapshots.push(engine.on_tick()),
            ReplayRecord::Tap { t_ms } => {
                if !engine.record_tap_at(t_ms) {
                    rejected_taps += 1;
                }
            }
            ReplayRecord::Drop => engine.skip_ticks(1),
        }
    }

    let final_snapshot = engine.snapshot();
    info!(
        ticks = final_snapshot.ticks_applied,
        dropped = final_snapshot.ticks_dropped,
        rejected_taps,
        "replay finished"
    );

    Ok(ReplayOutcome {
        snapshots,
        final_snapshot,
        rejected_taps,
    })
}

/// Parse and replay an NDJSON session
pub fn replay_ndjson(config: EngineConfig, ndjson: &str) -> Result<ReplayOutcome, FluxError> {
    let records = parse_replay(ndjson)?;
    debug!(records = records.len(), "parsed replay stream");
    replay(config, &records)
}

/// Replay an NDJSON session and encode the final state as a JSON report
/// (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let report_json = session_to_report(EngineConfig::default(), ndjson, "Subject A")?;
/// ```
pub fn session_to_report(
    config: EngineConfig,
    ndjson: &str,
    subject: &str,
) -> Result<String, FluxError> {
    let outcome = replay_ndjson(config, ndjson)?;
    ReportEncoder::new().encode_to_json(&outcome.final_snapshot, subject)
}
