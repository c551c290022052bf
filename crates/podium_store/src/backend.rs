//! Key-value store trait definition.

use crate::error::StoreResult;

/// A local key-value store for Podium.
///
/// Stores are **opaque string stores**: flat string keys, string values,
/// no transactions. Podium owns all interpretation of the namespace -
/// backends do not understand datasets, backups, or configuration blobs.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently `put` for that key
/// - `remove` of an absent key is a no-op, not an error
/// - `keys` returns every currently stored key, in unspecified order
/// - Stores must be `Send + Sync` for concurrent access
///
/// There is no coordination against other processes opening the same
/// backing file; concurrent external writers can race (a documented
/// limitation of the whole subsystem).
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - For testing
/// - [`crate::FileStore`] - For persistent storage
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Returns all currently stored keys.
    fn keys(&self) -> StoreResult<Vec<String>>;
}
