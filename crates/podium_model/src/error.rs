//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while working with model types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A status string did not name a known status.
    #[error("unknown status: {0:?}")]
    UnknownStatus(String),

    /// A strategy string did not name a known merge strategy.
    #[error("unknown merge strategy: {0:?}")]
    UnknownStrategy(String),
}
