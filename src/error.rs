//! Error types for the anomaly analysis engine.

use thiserror::Error;

use crate::llm::LlmError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for engine operations
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally invalid dataset (not a list of records, non-numeric indicator, ...)
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// AI provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_dataset(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
