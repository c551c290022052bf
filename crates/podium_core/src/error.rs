//! Error types for Podium core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key-value store error.
    #[error("store error: {0}")]
    Store(#[from] podium_store::StoreError),

    /// Model-level error.
    #[error("model error: {0}")]
    Model(#[from] podium_model::ModelError),

    /// A persisted value could not be parsed.
    ///
    /// Unparseable persisted payloads are treated as corruption by callers.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted data is structurally invalid.
    #[error("corrupt data: {message}")]
    Corrupt {
        /// Description of the defect.
        message: String,
    },
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
