//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote service rejected the request.
    ///
    /// Auth failures and not-found conditions are distinguished only by the
    /// propagated status; the engine treats them all as retryable remote
    /// failures.
    #[error("remote error: status {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response detail.
        message: String,
    },

    /// The remote document exists but does not contain the data file.
    #[error("data file {file:?} not found in remote document")]
    DocumentMissing {
        /// Expected file name.
        file: String,
    },

    /// A payload could not be (de)serialized. Treated as corruption, not a
    /// transient failure - retrying will not help.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local repository error.
    #[error("local store error: {0}")]
    Core(#[from] podium_core::CoreError),

    /// Model-level error.
    #[error("model error: {0}")]
    Model(#[from] podium_model::ModelError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the retry/backoff policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Remote { .. } => true,
            SyncError::DocumentMissing { .. } => true,
            SyncError::Serialization(_) => false,
            SyncError::Core(_) => false,
            SyncError::Model(_) => false,
        }
    }
}
