//! Error types for backup operations.

use thiserror::Error;

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur during backup operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Local repository error.
    #[error("local store error: {0}")]
    Core(#[from] podium_core::CoreError),

    /// Model-level error.
    #[error("model error: {0}")]
    Model(#[from] podium_model::ModelError),

    /// A backup payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The consistency check could not reach the remote store.
    #[error("sync error: {0}")]
    Sync(#[from] podium_sync::SyncError),

    /// No backup stored under the given id.
    #[error("backup not found: {id}")]
    NotFound {
        /// The requested backup id.
        id: String,
    },

    /// The backup exists but cannot be used for a restore.
    #[error("backup {id} cannot be restored: {reason}")]
    NotRestorable {
        /// The backup id.
        id: String,
        /// Why restoring is impossible.
        reason: String,
    },
}
