//! motor-flux - Streaming motor-symptom severity scoring
//!
//! Flux turns three sensor channels into three normalized severity scores through
//! a tick-driven pipeline: channel sampling → validation → normalization
//! (tremor, pressure) and tap-window rate estimation (tapping) → zone
//! classification.
//!
//! ## Modules
//!
//! - **Engine**: [`MetricEngine`] owns the published scores and runs one update per tick
//! - **Tick loop**: [`TickLoop`] drives an engine at a fixed period on a worker thread
//! - **Replay**: recorded NDJSON sessions replayed deterministically through a fresh engine
//! - **Report**: [`ReportEncoder`] renders a snapshot into a JSON assessment report

pub mod clock;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod rate;
pub mod replay;
pub mod runner;
pub mod sampler;
pub mod tap_log;
pub mod types;
pub mod zone;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{EngineConfig, TremorTiming};
pub use encoder::{AssessmentReport, ReportEncoder};
pub use engine::{MetricEngine, TapTrigger};
pub use error::FluxError;
pub use pipeline::{replay, replay_ndjson, session_to_report, ReplayOutcome};
pub use runner::{TickLoop, TickSchedule};
pub use sampler::{ChannelSampler, ScriptedSampler, SyntheticSampler};
pub use types::{ChannelReading, ForceSample, MetricSnapshot, SensorSample, SeverityScores};
pub use zone::{Assessment, Zone};

/// Flux version embedded in all reports
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "motor-flux";
