//! The backup manager: snapshots, retention, integrity, repair, restore.

use crate::backup::{Backup, BackupIndexEntry, BackupKind, BackupPayload};
use crate::error::{BackupError, BackupResult};
use crate::integrity::{self, RepairReport, Severity};
use crate::CorruptionFlag;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::{Mutex, RwLock};
use podium_core::{keys, Event, EventBus, LocalRepository};
use podium_model::{dataset_checksum, value_checksum, Dataset};
use podium_store::KvStore;
use podium_sync::RemoteStore;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for backup operations.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Interval between scheduled full backups.
    pub backup_interval: Duration,
    /// Backups older than this many days are deleted on every store.
    pub retention_days: i64,
    /// Delay before the startup integrity check.
    pub integrity_check_delay: Duration,
    /// Interval between sync-consistency checks.
    pub consistency_interval: Duration,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_interval: Duration::from_secs(24 * 60 * 60),
            retention_days: 30,
            integrity_check_delay: Duration::from_secs(5),
            consistency_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl BackupConfig {
    /// Sets the full-backup interval.
    pub fn with_backup_interval(mut self, interval: Duration) -> Self {
        self.backup_interval = interval;
        self
    }

    /// Sets the retention window in days.
    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Sets the startup integrity-check delay.
    pub fn with_integrity_check_delay(mut self, delay: Duration) -> Self {
        self.integrity_check_delay = delay;
        self
    }

    /// Sets the consistency-check interval.
    pub fn with_consistency_interval(mut self, interval: Duration) -> Self {
        self.consistency_interval = interval;
        self
    }
}

/// Outcome of an integrity check.
#[derive(Debug)]
pub struct IntegrityReport {
    /// Every structural defect found (possibly advisory only).
    pub flags: Vec<CorruptionFlag>,
    /// The persisted payload was not even JSON.
    pub unparseable: bool,
    /// What the repair pass changed, when one ran.
    pub repaired: Option<RepairReport>,
    /// Newest stored backup that passes corruption detection, offered when
    /// the live data cannot be mechanically repaired.
    pub restore_candidate: Option<Backup>,
}

impl IntegrityReport {
    fn clean(flags: Vec<CorruptionFlag>) -> Self {
        Self {
            flags,
            unparseable: false,
            repaired: None,
            restore_candidate: None,
        }
    }

    /// True when nothing beyond advisory flags was found.
    pub fn is_clean(&self) -> bool {
        !self.unparseable
            && self.repaired.is_none()
            && self.restore_candidate.is_none()
            && self
                .flags
                .iter()
                .all(|flag| flag.severity() == Severity::Advisory)
    }
}

/// Aggregate numbers for status displays.
#[derive(Debug, Clone)]
pub struct BackupStatus {
    /// Number of stored backups.
    pub total_backups: usize,
    /// Timestamp of the newest backup.
    pub last_backup: Option<DateTime<Utc>>,
    /// Timestamp of the oldest backup.
    pub oldest_backup: Option<DateTime<Utc>>,
    /// Approximate bytes of stored payloads.
    pub disk_usage_bytes: u64,
}

/// Creates, indexes, validates, and restores backups.
///
/// The payload store and the index are only ever mutated under one internal
/// lock, with removals paired, so they never disagree about which backups
/// exist. The optional remote handle powers the sync-consistency check; on
/// divergence the manager emits [`Event::SyncRequested`] rather than
/// resolving anything itself.
pub struct BackupManager<S: KvStore> {
    repo: Arc<LocalRepository<S>>,
    bus: Arc<EventBus>,
    remote: RwLock<Option<Arc<dyn RemoteStore>>>,
    config: BackupConfig,
    index_lock: Mutex<()>,
}

impl<S: KvStore> BackupManager<S> {
    /// Creates a manager from its collaborators.
    pub fn new(repo: Arc<LocalRepository<S>>, bus: Arc<EventBus>, config: BackupConfig) -> Self {
        Self {
            repo,
            bus,
            remote: RwLock::new(None),
            config,
            index_lock: Mutex::new(()),
        }
    }

    /// Wires the remote store used by the consistency check.
    pub fn set_remote(&self, remote: Arc<dyn RemoteStore>) {
        *self.remote.write() = Some(remote);
    }

    /// The configuration this manager runs with.
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    // --- snapshot creation ---

    /// Snapshots the entire current dataset.
    ///
    /// Stores the payload, updates the index, runs retention, and clears
    /// the change journal (the snapshot supersedes it).
    pub fn create_full_backup(&self) -> BackupResult<Backup> {
        let dataset = self.repo.load_dataset()?;
        let data = serde_json::to_value(&dataset)?;
        let checksum = value_checksum(&data)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("speakerCount".to_owned(), dataset.len().to_string());

        let backup = Backup {
            id: format!("backup-{}", Uuid::new_v4()),
            kind: BackupKind::Full,
            timestamp: Utc::now(),
            version: dataset.version,
            checksum,
            payload: BackupPayload::Full { data },
            metadata,
        };

        self.store_backup(&backup)?;
        self.repo.journal_clear()?;
        info!(id = %backup.id, version = backup.version, "full backup created");
        self.bus.emit(Event::BackupCreated {
            id: backup.id.clone(),
        });
        Ok(backup)
    }

    /// Snapshots the current state *as stored*, even when it is corrupt,
    /// for forensic purposes. Does not touch the journal.
    pub fn create_emergency_backup(&self) -> BackupResult<Backup> {
        let speakers = match self.repo.load_raw_records() {
            Ok(Some(records)) => records,
            Ok(None) => Value::Array(Vec::new()),
            // Not even JSON: embed the raw text so nothing is lost.
            Err(_) => Value::from(
                self.repo
                    .store()
                    .get(keys::SPEAKERS)
                    .map_err(podium_core::CoreError::from)?
                    .unwrap_or_default(),
            ),
        };

        let raw_version = self
            .repo
            .store()
            .get(keys::VERSION)
            .map_err(podium_core::CoreError::from)?;
        let raw_modified = self
            .repo
            .store()
            .get(keys::LAST_MODIFIED)
            .map_err(podium_core::CoreError::from)?;

        let version = raw_version
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let data = json!({
            "version": raw_version,
            "lastModified": raw_modified,
            "speakers": speakers,
        });
        let checksum = value_checksum(&data)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("emergency".to_owned(), "true".to_owned());

        let backup = Backup {
            id: format!("emergency-{}", Uuid::new_v4()),
            kind: BackupKind::Full,
            timestamp: Utc::now(),
            version,
            checksum,
            payload: BackupPayload::Full { data },
            metadata,
        };

        self.store_backup(&backup)?;
        warn!(id = %backup.id, "emergency backup of current state created");
        Ok(backup)
    }

    /// Drains the change journal into an incremental backup.
    ///
    /// Produces nothing when the journal is empty - no change since the
    /// last backup means there is nothing to describe.
    pub fn create_incremental_backup(&self) -> BackupResult<Option<Backup>> {
        let changes = self.repo.journal_drain()?;
        if changes.is_empty() {
            debug!("no journaled changes, skipping incremental backup");
            return Ok(None);
        }

        let checksum = value_checksum(&serde_json::to_value(&changes)?)?;
        let version = changes.last().map(|entry| entry.version).unwrap_or(1);

        let mut metadata = BTreeMap::new();
        metadata.insert("changeCount".to_owned(), changes.len().to_string());

        let backup = Backup {
            id: format!("incremental-{}", Uuid::new_v4()),
            kind: BackupKind::Incremental,
            timestamp: Utc::now(),
            version,
            checksum,
            payload: BackupPayload::Incremental { changes },
            metadata,
        };

        self.store_backup(&backup)?;
        info!(id = %backup.id, "incremental backup created");
        self.bus.emit(Event::BackupCreated {
            id: backup.id.clone(),
        });
        Ok(Some(backup))
    }

    /// Stores a backup and its index entry, then runs retention cleanup.
    ///
    /// Index and payload store are mutated under one lock and removals are
    /// paired, so they never disagree about which backups exist.
    fn store_backup(&self, backup: &Backup) -> BackupResult<()> {
        let _lock = self.index_lock.lock();

        self.repo
            .backup_put(&backup.id, &serde_json::to_string(backup)?)?;

        let mut index = self.load_index()?;
        index.push(BackupIndexEntry::from(backup));
        index.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let cutoff = Utc::now() - ChronoDuration::days(self.config.retention_days);
        let (keep, expired): (Vec<_>, Vec<_>) =
            index.into_iter().partition(|entry| entry.timestamp >= cutoff);

        for entry in &expired {
            self.repo.backup_remove(&entry.id)?;
        }
        if !expired.is_empty() {
            info!(removed = expired.len(), "retention deleted expired backups");
        }

        self.repo
            .save_backup_index_blob(&serde_json::to_string(&keep)?)?;
        Ok(())
    }

    fn load_index(&self) -> BackupResult<Vec<BackupIndexEntry>> {
        match self.repo.backup_index_blob()? {
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(index) => Ok(index),
                Err(e) => {
                    warn!(error = %e, "backup index unparseable, treating as empty");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Lists stored backups, newest first, without loading payloads.
    pub fn list_backups(&self) -> BackupResult<Vec<BackupIndexEntry>> {
        let _lock = self.index_lock.lock();
        self.load_index()
    }

    /// Loads a backup payload by id.
    pub fn load_backup(&self, id: &str) -> BackupResult<Backup> {
        let blob = self
            .repo
            .backup_get(id)?
            .ok_or_else(|| BackupError::NotFound { id: id.to_owned() })?;
        Ok(serde_json::from_str(&blob)?)
    }

    // --- integrity ---

    /// Validates the persisted record collection and reacts to what it
    /// finds: repairs id/name defects in place, or - for defects a repair
    /// cannot fix - snapshots the corrupt state and proposes the newest
    /// clean backup for restore.
    pub fn integrity_check(&self) -> BackupResult<IntegrityReport> {
        debug!("running integrity check");

        let raw = match self.repo.load_raw_records() {
            Ok(Some(records)) => records,
            Ok(None) => {
                self.consistency_check_best_effort();
                return Ok(IntegrityReport::clean(Vec::new()));
            }
            Err(e) => {
                warn!(error = %e, "persisted records are not JSON, treating as corruption");
                let restore_candidate = self.handle_corruption()?;
                return Ok(IntegrityReport {
                    flags: Vec::new(),
                    unparseable: true,
                    repaired: None,
                    restore_candidate,
                });
            }
        };

        let flags = integrity::detect(&raw);
        let worst = flags.iter().map(CorruptionFlag::severity).max();
        for flag in &flags {
            warn!(%flag, "integrity defect");
        }

        match worst {
            None | Some(Severity::Advisory) => {
                self.consistency_check_best_effort();
                Ok(IntegrityReport::clean(flags))
            }
            Some(Severity::Repairable) => {
                // Forensic snapshot first, then fix in place.
                if let Err(e) = self.create_emergency_backup() {
                    warn!(error = %e, "emergency backup before repair failed");
                }
                let report = self.repair_in_place(&raw)?;
                Ok(IntegrityReport {
                    flags,
                    unparseable: false,
                    repaired: Some(report),
                    restore_candidate: None,
                })
            }
            Some(Severity::Fatal) => {
                let restore_candidate = self.handle_corruption()?;
                Ok(IntegrityReport {
                    flags,
                    unparseable: false,
                    repaired: None,
                    restore_candidate,
                })
            }
        }
    }

    /// Repairs id/name defects, persists the result, and snapshots it.
    fn repair_in_place(&self, raw: &Value) -> BackupResult<RepairReport> {
        let (speakers, report) = integrity::repair(raw)?;

        let version = self
            .repo
            .store()
            .get(keys::VERSION)
            .map_err(podium_core::CoreError::from)?
            .and_then(|raw_version| raw_version.parse().ok())
            .unwrap_or(1);
        let metadata = self
            .repo
            .store()
            .get(keys::METADATA)
            .map_err(podium_core::CoreError::from)?
            .and_then(|blob| serde_json::from_str(&blob).ok())
            .unwrap_or_default();

        let dataset = Dataset {
            version,
            last_modified: Utc::now(),
            speakers,
            metadata,
        };
        self.repo.save_dataset(&dataset)?;
        self.create_full_backup()?;

        info!(
            assigned = report.assigned_ids,
            renamed = report.defaulted_names,
            reassigned = report.reassigned_duplicates,
            "repaired persisted dataset"
        );
        self.bus.emit(Event::LocalDataUpdated(dataset));
        Ok(report)
    }

    /// Emergency-snapshots the corrupt state, then scans for a restore
    /// candidate.
    fn handle_corruption(&self) -> BackupResult<Option<Backup>> {
        if let Err(e) = self.create_emergency_backup() {
            warn!(error = %e, "emergency backup failed");
        }
        self.find_restore_candidate()
    }

    /// Scans the index newest-first for the first full backup that passes
    /// corruption detection with zero flags, loading payloads lazily.
    pub fn find_restore_candidate(&self) -> BackupResult<Option<Backup>> {
        for entry in self.list_backups()? {
            if entry.kind != BackupKind::Full {
                continue;
            }
            let backup = match self.load_backup(&entry.id) {
                Ok(backup) => backup,
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "skipping unreadable backup");
                    continue;
                }
            };
            let Some(data) = backup.payload.as_data() else {
                continue;
            };
            match value_checksum(data) {
                Ok(checksum) if checksum == backup.checksum => {}
                _ => {
                    warn!(id = %backup.id, "skipping backup with checksum mismatch");
                    continue;
                }
            }

            let speakers = data.get("speakers").cloned().unwrap_or(Value::Null);
            let decodes = serde_json::from_value::<Dataset>(data.clone()).is_ok();
            if decodes && integrity::detect(&speakers).is_empty() {
                info!(id = %backup.id, "restore candidate found");
                return Ok(Some(backup));
            }
        }
        Ok(None)
    }

    // --- restore ---

    /// Replaces the live dataset wholesale with a backup's snapshot.
    ///
    /// Persists the backup's version and timestamp as-is (a restore is an
    /// explicit rollback) and notifies the record owner to reload.
    pub fn restore(&self, id: &str) -> BackupResult<Dataset> {
        let backup = self.load_backup(id)?;
        let data = backup
            .payload
            .as_data()
            .ok_or_else(|| BackupError::NotRestorable {
                id: id.to_owned(),
                reason: "incremental backups carry no snapshot".to_owned(),
            })?;

        let dataset: Dataset = serde_json::from_value(data.clone())?;
        self.repo.save_dataset(&dataset)?;
        info!(id, version = dataset.version, "dataset restored from backup");
        self.bus.emit(Event::LocalDataUpdated(dataset.clone()));
        Ok(dataset)
    }

    // --- consistency ---

    /// Compares the local dataset checksum against the remote copy's.
    ///
    /// On mismatch, emits [`Event::SyncRequested`] so the engine resolves
    /// the divergence; this manager never merges. Returns whether the two
    /// copies agree. A no-op `Ok(true)` when no remote is wired.
    pub fn check_sync_consistency(&self) -> BackupResult<bool> {
        let Some(remote) = self.remote.read().clone() else {
            return Ok(true);
        };

        let local = self.repo.load_dataset()?;
        let remote_dataset = remote.fetch()?;

        let local_checksum = dataset_checksum(&local)?;
        let remote_checksum = dataset_checksum(&remote_dataset)?;
        if local_checksum != remote_checksum {
            warn!("local and remote checksums differ, requesting sync");
            self.bus.emit(Event::SyncRequested);
            Ok(false)
        } else {
            Ok(true)
        }
    }

    fn consistency_check_best_effort(&self) {
        if let Err(e) = self.check_sync_consistency() {
            warn!(error = %e, "sync consistency check failed");
        }
    }

    // --- status ---

    /// Aggregate numbers for status displays.
    pub fn status(&self) -> BackupResult<BackupStatus> {
        let index = self.list_backups()?;
        let mut disk_usage_bytes = 0u64;
        for entry in &index {
            if let Some(blob) = self.repo.backup_get(&entry.id)? {
                disk_usage_bytes += blob.len() as u64;
            }
        }

        Ok(BackupStatus {
            total_backups: index.len(),
            last_backup: index.first().map(|entry| entry.timestamp),
            oldest_backup: index.last().map(|entry| entry.timestamp),
            disk_usage_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use podium_model::Record;
    use podium_store::MemoryStore;
    use podium_sync::MockRemoteStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn fixture() -> (Arc<LocalRepository<MemoryStore>>, Arc<EventBus>, BackupManager<MemoryStore>) {
        let repo = Arc::new(LocalRepository::new(MemoryStore::new()));
        let bus = Arc::new(EventBus::new());
        let manager = BackupManager::new(Arc::clone(&repo), Arc::clone(&bus), BackupConfig::default());
        (repo, bus, manager)
    }

    #[test]
    fn full_backup_snapshots_and_indexes() {
        let (repo, _bus, manager) = fixture();
        let mut dataset = Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]);
        dataset.version = 3;
        repo.save_dataset(&dataset).unwrap();

        let backup = manager.create_full_backup().unwrap();
        assert_eq!(backup.kind, BackupKind::Full);
        assert_eq!(backup.version, 3);

        let index = manager.list_backups().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, backup.id);

        // Payload is loadable and checksum-verified.
        let loaded = manager.load_backup(&backup.id).unwrap();
        let data = loaded.payload.as_data().unwrap();
        assert_eq!(value_checksum(data).unwrap(), loaded.checksum);

        // The snapshot supersedes the journal.
        assert!(repo.journal_entries().unwrap().is_empty());
    }

    #[test]
    fn incremental_backup_drains_the_journal() {
        let (repo, _bus, manager) = fixture();
        repo.save_dataset(&Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]))
            .unwrap();
        manager.create_full_backup().unwrap();

        // Nothing journaled: no backup.
        assert!(manager.create_incremental_backup().unwrap().is_none());

        repo.record_change(t0() + ChronoDuration::minutes(1)).unwrap();
        repo.record_change(t0() + ChronoDuration::minutes(2)).unwrap();

        let backup = manager.create_incremental_backup().unwrap().unwrap();
        assert_eq!(backup.kind, BackupKind::Incremental);
        assert_eq!(backup.payload.as_changes().unwrap().len(), 2);

        // Drained: a second call produces nothing.
        assert!(manager.create_incremental_backup().unwrap().is_none());
    }

    #[test]
    fn retention_removes_payload_and_index_together() {
        let (repo, _bus, manager) = fixture();
        repo.save_dataset(&Dataset::new(t0())).unwrap();

        // Plant an expired backup directly in the store; store_backup would
        // reap it on the spot.
        let expired_entry = BackupIndexEntry {
            id: "backup-old".into(),
            kind: BackupKind::Full,
            timestamp: Utc::now() - ChronoDuration::days(45),
            version: 1,
            checksum: 0,
        };
        repo.backup_put("backup-old", "{}").unwrap();
        repo.save_backup_index_blob(&serde_json::to_string(&vec![expired_entry]).unwrap())
            .unwrap();
        assert!(repo.backup_get("backup-old").unwrap().is_some());

        // Any store triggers retention.
        manager.create_full_backup().unwrap();

        let index = manager.list_backups().unwrap();
        let cutoff = Utc::now() - ChronoDuration::days(manager.config().retention_days);
        assert!(index.iter().all(|entry| entry.timestamp >= cutoff));
        assert!(!index.iter().any(|entry| entry.id == "backup-old"));
        assert!(repo.backup_get("backup-old").unwrap().is_none());

        // Index exactly matches the stored set.
        for entry in &index {
            assert!(repo.backup_get(&entry.id).unwrap().is_some());
        }
    }

    #[test]
    fn duplicate_ids_are_repaired_and_snapshotted() {
        let (repo, bus, manager) = fixture();
        let rx = bus.subscribe();
        repo.store()
            .put(
                keys::SPEAKERS,
                r#"[{"id":5,"name":"A"},{"id":5,"name":"B"}]"#,
            )
            .unwrap();

        let report = manager.integrity_check().unwrap();
        assert!(report
            .flags
            .contains(&CorruptionFlag::DuplicateId { id: 5 }));
        assert_eq!(report.repaired.unwrap().reassigned_duplicates, 1);

        let dataset = repo.load_dataset().unwrap();
        assert_eq!(dataset.len(), 2);
        let ids: Vec<u64> = dataset.speakers.iter().map(|r| r.id).collect();
        assert!(ids.contains(&5));
        assert!(ids.iter().any(|&id| id > 5));

        // A fresh full backup of the repaired state exists (plus the
        // forensic emergency snapshot).
        let index = manager.list_backups().unwrap();
        assert!(index.iter().any(|e| e.id.starts_with("backup-")));
        assert!(index.iter().any(|e| e.id.starts_with("emergency-")));

        // The owner was told to reload.
        assert!(rx
            .try_iter()
            .any(|e| matches!(e, Event::LocalDataUpdated(_))));
    }

    #[test]
    fn fatal_corruption_offers_newest_clean_backup() {
        let (repo, _bus, manager) = fixture();

        // A known-good snapshot first.
        repo.save_dataset(&Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]))
            .unwrap();
        let good = manager.create_full_backup().unwrap();

        // Now corrupt the live data in a way repair cannot fix.
        repo.store()
            .put(keys::SPEAKERS, r#"[{"id":1,"name":"Ada","email":42}]"#)
            .unwrap();

        let report = manager.integrity_check().unwrap();
        assert!(report.repaired.is_none());
        let candidate = report.restore_candidate.expect("candidate expected");
        assert_eq!(candidate.id, good.id);

        // The corrupt state was snapshotted for forensics.
        assert!(manager
            .list_backups()
            .unwrap()
            .iter()
            .any(|e| e.id.starts_with("emergency-")));
    }

    #[test]
    fn unparseable_payload_follows_the_corruption_path() {
        let (repo, _bus, manager) = fixture();
        repo.save_dataset(&Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]))
            .unwrap();
        manager.create_full_backup().unwrap();

        repo.store().put(keys::SPEAKERS, "{{{garbage").unwrap();

        let report = manager.integrity_check().unwrap();
        assert!(report.unparseable);
        assert!(report.restore_candidate.is_some());
    }

    #[test]
    fn restore_replaces_the_dataset_wholesale() {
        let (repo, bus, manager) = fixture();
        let mut original = Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]);
        original.version = 2;
        repo.save_dataset(&original).unwrap();
        let backup = manager.create_full_backup().unwrap();

        // Live data moves on.
        let mut later = Dataset::with_speakers(
            t0() + ChronoDuration::hours(1),
            vec![Record::new(1, "Ada"), Record::new(2, "Grace")],
        );
        later.version = 3;
        repo.save_dataset(&later).unwrap();

        let rx = bus.subscribe();
        let restored = manager.restore(&backup.id).unwrap();
        assert_eq!(restored, original);
        assert_eq!(repo.load_dataset().unwrap(), original);
        assert!(rx
            .try_iter()
            .any(|e| matches!(e, Event::LocalDataUpdated(_))));
    }

    #[test]
    fn incremental_backups_cannot_be_restored() {
        let (repo, _bus, manager) = fixture();
        repo.save_dataset(&Dataset::new(t0())).unwrap();
        repo.record_change(t0()).unwrap();
        let backup = manager.create_incremental_backup().unwrap().unwrap();

        assert!(matches!(
            manager.restore(&backup.id),
            Err(BackupError::NotRestorable { .. })
        ));
    }

    #[test]
    fn missing_backup_is_not_found() {
        let (_repo, _bus, manager) = fixture();
        assert!(matches!(
            manager.restore("backup-nope"),
            Err(BackupError::NotFound { .. })
        ));
    }

    #[test]
    fn consistency_mismatch_requests_a_sync() {
        let (repo, bus, manager) = fixture();
        repo.save_dataset(&Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]))
            .unwrap();

        // Diverged remote copy.
        let remote = Arc::new(MockRemoteStore::with_document(Dataset::with_speakers(
            t0(),
            vec![Record::new(1, "Ada").with_email("x@y.test")],
        )));
        manager.set_remote(remote);

        let rx = bus.subscribe();
        assert!(!manager.check_sync_consistency().unwrap());
        assert!(rx.try_iter().any(|e| matches!(e, Event::SyncRequested)));
    }

    #[test]
    fn consistency_agreement_is_quiet() {
        let (repo, bus, manager) = fixture();
        let dataset = Dataset::with_speakers(t0(), vec![Record::new(1, "Ada")]);
        repo.save_dataset(&dataset).unwrap();
        manager.set_remote(Arc::new(MockRemoteStore::with_document(dataset)));

        let rx = bus.subscribe();
        assert!(manager.check_sync_consistency().unwrap());
        assert!(!rx.try_iter().any(|e| matches!(e, Event::SyncRequested)));
    }

    #[test]
    fn status_summarizes_the_index() {
        let (repo, _bus, manager) = fixture();
        repo.save_dataset(&Dataset::new(t0())).unwrap();

        assert_eq!(manager.status().unwrap().total_backups, 0);

        manager.create_full_backup().unwrap();
        repo.record_change(t0()).unwrap();
        manager.create_incremental_backup().unwrap();

        let status = manager.status().unwrap();
        assert_eq!(status.total_backups, 2);
        assert!(status.last_backup.is_some());
        assert!(status.disk_usage_bytes > 0);
    }
}
