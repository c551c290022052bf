//! Remote store abstraction.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use podium_model::Dataset;
use std::sync::atomic::{AtomicU32, Ordering};

/// A remote copy of the dataset, mutated only by whole-document replace.
///
/// Implementations do not retry; the retry/backoff policy belongs to the
/// engine. Failures are opaque to callers - an auth failure and a dropped
/// connection follow the same path.
pub trait RemoteStore: Send + Sync {
    /// Fetches the remote dataset.
    fn fetch(&self) -> SyncResult<Dataset>;

    /// Replaces the remote dataset wholesale.
    fn replace(&self, dataset: &Dataset) -> SyncResult<()>;
}

/// An in-memory remote store with scriptable failures.
///
/// Used by the engine tests and available to downstream crates: set a
/// document, script the next N calls to fail, and inspect what was stored.
#[derive(Default)]
pub struct MockRemoteStore {
    document: RwLock<Option<Dataset>>,
    fail_fetches: AtomicU32,
    fail_replaces: AtomicU32,
    fetch_calls: AtomicU32,
    replace_calls: AtomicU32,
}

impl MockRemoteStore {
    /// Creates an empty mock remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock remote holding `dataset`.
    pub fn with_document(dataset: Dataset) -> Self {
        let store = Self::default();
        *store.document.write() = Some(dataset);
        store
    }

    /// Replaces the stored document directly (no call counting).
    pub fn set_document(&self, dataset: Dataset) {
        *self.document.write() = Some(dataset);
    }

    /// Returns a copy of the stored document.
    pub fn document(&self) -> Option<Dataset> {
        self.document.read().clone()
    }

    /// Makes the next `n` fetches fail with a retryable transport error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.fail_fetches.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` replaces fail with a retryable transport error.
    pub fn fail_next_replaces(&self, n: u32) {
        self.fail_replaces.store(n, Ordering::SeqCst);
    }

    /// Number of fetch calls seen.
    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of replace calls seen.
    pub fn replace_calls(&self) -> u32 {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl RemoteStore for MockRemoteStore {
    fn fetch(&self) -> SyncResult<Dataset> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_fetches) {
            return Err(SyncError::transport_retryable("simulated fetch failure"));
        }
        self.document.read().clone().ok_or(SyncError::Remote {
            status: 404,
            message: "document not found".to_owned(),
        })
    }

    fn replace(&self, dataset: &Dataset) -> SyncResult<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_replaces) {
            return Err(SyncError::transport_retryable("simulated replace failure"));
        }
        *self.document.write() = Some(dataset.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use podium_model::Record;

    fn dataset() -> Dataset {
        Dataset::with_speakers(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            vec![Record::new(1, "Ada")],
        )
    }

    #[test]
    fn empty_mock_is_not_found() {
        let remote = MockRemoteStore::new();
        assert!(matches!(
            remote.fetch(),
            Err(SyncError::Remote { status: 404, .. })
        ));
    }

    #[test]
    fn replace_then_fetch_roundtrip() {
        let remote = MockRemoteStore::new();
        let d = dataset();
        remote.replace(&d).unwrap();
        assert_eq!(remote.fetch().unwrap(), d);
        assert_eq!(remote.replace_calls(), 1);
        assert_eq!(remote.fetch_calls(), 1);
    }

    #[test]
    fn scripted_failures_are_consumed() {
        let remote = MockRemoteStore::with_document(dataset());
        remote.fail_next_fetches(2);

        assert!(remote.fetch().is_err());
        assert!(remote.fetch().is_err());
        assert!(remote.fetch().is_ok());
        assert_eq!(remote.fetch_calls(), 3);
    }
}
