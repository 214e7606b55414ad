//! Error types for pointgraph-core.
//!
//! The taxonomy is deliberately small: analyses are batch computations
//! over trusted IR, so most "not found" situations answer with empty sets
//! instead of errors, and IR inconsistencies panic as programmer bugs.

use thiserror::Error;

/// Main error type for pointgraph operations.
#[derive(Debug, Error)]
pub enum PointgraphError {
    /// IO error (configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis cannot start (e.g. no entry method).
    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl PointgraphError {
    pub fn config(msg: impl Into<String>) -> Self {
        PointgraphError::Config(msg.into())
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        PointgraphError::Analysis(msg.into())
    }
}

/// Result type alias for pointgraph operations.
pub type Result<T> = std::result::Result<T, PointgraphError>;
