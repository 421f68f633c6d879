//! Error types for motor-flux

use thiserror::Error;

/// Errors that can occur while configuring or driving the engine.
///
/// Normal ticking never produces an error: missing or invalid readings and
/// insufficient tap data all resolve to "previous score retained".
#[derive(Debug, Error)]
pub enum FluxError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Replay error at line {line}: {reason}")]
    ReplayError { line: usize, reason: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
