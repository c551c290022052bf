//! Typed repository over the shared key-value namespace.

use crate::error::CoreResult;
use crate::journal::ChangeEntry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use podium_model::{dataset_checksum, Dataset, Record};
use podium_store::KvStore;
use std::collections::BTreeMap;
use tracing::warn;

/// The key namespace, shared by the sync engine and the backup manager.
pub mod keys {
    /// Record array JSON.
    pub const SPEAKERS: &str = "speakers";
    /// ISO8601 timestamp of the last sync-relevant mutation.
    pub const LAST_MODIFIED: &str = "speakers.last_modified";
    /// Dataset version counter.
    pub const VERSION: &str = "speakers.version";
    /// Dataset metadata JSON.
    pub const METADATA: &str = "speakers.metadata";
    /// Sync configuration blob.
    pub const SYNC_CONFIG: &str = "sync.config";
    /// Backup index blob.
    pub const BACKUP_INDEX: &str = "backup.index";
    /// Prefix for per-backup payload keys.
    pub const BACKUP_PREFIX: &str = "backup.";
    /// Change journal blob.
    pub const JOURNAL: &str = "journal";
}

/// Typed accessors over a [`KvStore`].
///
/// The repository is the only code that interprets the namespace; everything
/// above it works with model types. Construct one per store and share it
/// behind an `Arc`.
pub struct LocalRepository<S: KvStore> {
    store: S,
    // Journal mutations are read-modify-write; the sync and backup workers
    // both touch the journal.
    journal_lock: Mutex<()>,
}

impl<S: KvStore> LocalRepository<S> {
    /// Wraps a key-value store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            journal_lock: Mutex::new(()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // --- dataset ---

    /// Loads the persisted dataset.
    ///
    /// Missing pieces default to an empty record list, version 1, and the
    /// Unix epoch as `last_modified` - so a freshly provisioned client never
    /// out-dates a populated remote on its first sync. An unparseable record
    /// array is an error (the integrity checker deals with it via
    /// [`Self::load_raw_records`]).
    pub fn load_dataset(&self) -> CoreResult<Dataset> {
        let speakers: Vec<Record> = match self.store.get(keys::SPEAKERS)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        let last_modified = self
            .store
            .get(keys::LAST_MODIFIED)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let version = self
            .store
            .get(keys::VERSION)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);

        let metadata: BTreeMap<String, serde_json::Value> = match self.store.get(keys::METADATA)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => BTreeMap::new(),
        };

        Ok(Dataset {
            version,
            last_modified,
            speakers,
            metadata,
        })
    }

    /// Persists a dataset and journals the replacement.
    pub fn save_dataset(&self, dataset: &Dataset) -> CoreResult<()> {
        self.store
            .put(keys::SPEAKERS, &serde_json::to_string(&dataset.speakers)?)?;
        self.store
            .put(keys::LAST_MODIFIED, &dataset.last_modified.to_rfc3339())?;
        self.store.put(keys::VERSION, &dataset.version.to_string())?;
        self.store
            .put(keys::METADATA, &serde_json::to_string(&dataset.metadata)?)?;

        let checksum = dataset_checksum(dataset)?;
        self.journal_append(ChangeEntry::dataset_replaced(
            dataset.last_modified,
            dataset.version,
            checksum,
        ))?;
        Ok(())
    }

    /// Records an external mutation of the record set: bumps the
    /// last-modified timestamp and journals a local edit.
    ///
    /// The external owner persists the records itself; this call only makes
    /// the change visible to sync and backup.
    pub fn record_change(&self, now: DateTime<Utc>) -> CoreResult<()> {
        self.store.put(keys::LAST_MODIFIED, &now.to_rfc3339())?;
        let version = self
            .store
            .get(keys::VERSION)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);
        self.journal_append(ChangeEntry::local_edit(now, version))
    }

    /// Loads the record array as an unvalidated JSON value, for integrity
    /// checking. `None` when nothing is persisted yet; an error when the
    /// stored payload is not JSON at all.
    pub fn load_raw_records(&self) -> CoreResult<Option<serde_json::Value>> {
        match self.store.get(keys::SPEAKERS)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // --- sync configuration ---

    /// Loads the persisted sync configuration blob.
    pub fn sync_config_blob(&self) -> CoreResult<Option<String>> {
        Ok(self.store.get(keys::SYNC_CONFIG)?)
    }

    /// Persists the sync configuration blob.
    pub fn save_sync_config_blob(&self, blob: &str) -> CoreResult<()> {
        Ok(self.store.put(keys::SYNC_CONFIG, blob)?)
    }

    // --- backups ---

    /// Stores a backup payload under its id.
    pub fn backup_put(&self, id: &str, payload: &str) -> CoreResult<()> {
        Ok(self.store.put(&backup_key(id), payload)?)
    }

    /// Loads a backup payload by id.
    pub fn backup_get(&self, id: &str) -> CoreResult<Option<String>> {
        Ok(self.store.get(&backup_key(id))?)
    }

    /// Removes a backup payload by id.
    pub fn backup_remove(&self, id: &str) -> CoreResult<()> {
        Ok(self.store.remove(&backup_key(id))?)
    }

    /// Loads the backup index blob.
    pub fn backup_index_blob(&self) -> CoreResult<Option<String>> {
        Ok(self.store.get(keys::BACKUP_INDEX)?)
    }

    /// Persists the backup index blob.
    pub fn save_backup_index_blob(&self, blob: &str) -> CoreResult<()> {
        Ok(self.store.put(keys::BACKUP_INDEX, blob)?)
    }

    // --- change journal ---

    /// Appends an entry to the change journal.
    pub fn journal_append(&self, entry: ChangeEntry) -> CoreResult<()> {
        let _lock = self.journal_lock.lock();
        let mut entries = self.read_journal()?;
        entries.push(entry);
        self.store
            .put(keys::JOURNAL, &serde_json::to_string(&entries)?)?;
        Ok(())
    }

    /// Returns all journal entries, oldest first.
    pub fn journal_entries(&self) -> CoreResult<Vec<ChangeEntry>> {
        let _lock = self.journal_lock.lock();
        self.read_journal()
    }

    /// Takes all journal entries, leaving the journal empty.
    pub fn journal_drain(&self) -> CoreResult<Vec<ChangeEntry>> {
        let _lock = self.journal_lock.lock();
        let entries = self.read_journal()?;
        if !entries.is_empty() {
            self.store.remove(keys::JOURNAL)?;
        }
        Ok(entries)
    }

    /// Clears the journal.
    pub fn journal_clear(&self) -> CoreResult<()> {
        let _lock = self.journal_lock.lock();
        Ok(self.store.remove(keys::JOURNAL)?)
    }

    /// An unparseable journal is logged and treated as empty; the journal
    /// is advisory input to incremental backups, not primary data.
    fn read_journal(&self) -> CoreResult<Vec<ChangeEntry>> {
        match self.store.get(keys::JOURNAL)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    warn!(error = %e, "change journal unparseable, starting fresh");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }
}

fn backup_key(id: &str) -> String {
    format!("{}{}", keys::BACKUP_PREFIX, id)
}
