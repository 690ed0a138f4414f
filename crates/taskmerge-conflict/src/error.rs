//! Error types for the conflict engine
//!
//! Per-conflict resolution failures are never surfaced as errors; they
//! degrade to "unresolved". These variants cover configuration and input
//! problems found before a merge pass starts.

use thiserror::Error;

/// Errors that can occur while configuring the engine or reading its input
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Invalid glob pattern in an override rule
    #[error("invalid glob pattern: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Override token that names neither a strategy nor a directive
    #[error("invalid strategy '{0}'")]
    InvalidStrategy(String),

    /// Analyses handed to the detector disagree or are malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Extractor output could not be parsed
    #[error("failed to parse analyses: {0}")]
    Parse(#[from] serde_json::Error),
}
