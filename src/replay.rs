//! Replay record schema
//!
//! A recorded session is an NDJSON stream, one record per line, tagged by
//! `"type"`:
//!
//! ```text
//! {"type":"tick","angular_rate":{"x":30.0,"y":0.0,"z":0.0},"force":55.0}
//! {"type":"tap","t_ms":1200}
//! {"type":"drop"}
//! ```
//!
//! A tick may omit either channel (or set it to `null`) to mark it missing.
//! `drop` stands for a tick the source could not run.

use serde::{Deserialize, Serialize};

use crate::error::FluxError;
use crate::types::{ChannelReading, ForceSample, SensorSample, TimestampMs};

/// One replayed event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayRecord {
    /// A tick with whatever channel data was sampled
    Tick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angular_rate: Option<SensorSample>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force: Option<ForceSample>,
    },
    /// A tap at a monotonic timestamp
    Tap { t_ms: TimestampMs },
    /// A tick that was dropped
    Drop,
}

impl ReplayRecord {
    /// Channel reading carried by a tick record
    pub fn reading(&self) -> Option<ChannelReading> {
        match *self {
            ReplayRecord::Tick {
                angular_rate,
                force,
            } => Some(ChannelReading {
                angular_rate,
                force,
            }),
            _ => None,
        }
    }
}

/// Parse an NDJSON replay stream. Blank lines are skipped.
pub fn parse_replay(ndjson: &str) -> Result<Vec<ReplayRecord>, FluxError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<ReplayRecord>(trimmed).map_err(|e| {
            FluxError::ReplayError {
                line: line_num + 1,
                reason: e.to_string(),
            }
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Serialize records back to NDJSON
pub fn to_ndjson(records: &[ReplayRecord]) -> Result<String, FluxError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
