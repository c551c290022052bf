//! Sync engine state machine.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::remote::RemoteStore;
use crate::resolver;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use podium_core::{Event, EventBus, LocalRepository};
use podium_store::KvStore;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync attempt in flight.
    Idle,
    /// A sync attempt is in flight.
    Syncing,
}

/// Why a sync request was dropped without attempting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Credential or document identifier missing; sync is not attempted
    /// until configuration is completed.
    NotConfigured,
    /// The client is offline; scheduling is suspended.
    Offline,
    /// Another sync attempt is in flight. The request is dropped, not
    /// queued - callers rely on the next periodic tick to catch up.
    InFlight,
}

/// What a sync cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local was strictly newer; the remote document was replaced
    /// wholesale.
    Pushed,
    /// Remote was strictly newer; the merged dataset was persisted locally.
    Merged {
        /// Number of record-level conflicts encountered.
        conflicts: usize,
    },
    /// Timestamps were equal; nothing to do.
    NoChange,
    /// The cycle was dropped before doing anything.
    Skipped(SkipReason),
}

/// Counters accumulated across the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed sync cycles (including no-ops).
    pub cycles_completed: u64,
    /// Cycles that pushed the local dataset.
    pub pushes: u64,
    /// Cycles that merged and applied the remote dataset.
    pub merges: u64,
    /// Conflicts encountered across all merges.
    pub conflicts_seen: u64,
    /// Retried attempts across all cycles.
    pub retries: u64,
    /// Message of the most recent terminal failure.
    pub last_error: Option<String>,
}

/// A point-in-time snapshot of the engine for status displays.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    /// Whether enough configuration exists to sync.
    pub configured: bool,
    /// Whether a sync attempt is in flight.
    pub syncing: bool,
    /// Whether the engine considers itself online.
    pub online: bool,
    /// Whether an unsynced local change is pending.
    pub dirty: bool,
    /// Completion time of the last successful cycle.
    pub last_sync: Option<DateTime<Utc>>,
}

/// Orchestrates fetch/compare/merge/push against the remote store.
///
/// Direction is decided by comparing `last_modified` wall-clock timestamps;
/// clock skew between clients can therefore discard an apparently-older
/// write, and nothing coordinates concurrent writers in other processes.
/// Both are deliberate simplifications of this design.
///
/// All collaborators are injected: the repository, the remote store, and
/// the event bus are owned values wired together at startup.
pub struct SyncEngine<S: KvStore> {
    repo: Arc<LocalRepository<S>>,
    remote: Arc<dyn RemoteStore>,
    bus: Arc<EventBus>,
    config: RwLock<SyncConfig>,
    syncing: AtomicBool,
    online: AtomicBool,
    dirty: AtomicBool,
    last_sync: RwLock<Option<DateTime<Utc>>>,
    stats: RwLock<SyncStats>,
}

impl<S: KvStore> SyncEngine<S> {
    /// Creates an engine from its collaborators.
    pub fn new(
        repo: Arc<LocalRepository<S>>,
        remote: Arc<dyn RemoteStore>,
        bus: Arc<EventBus>,
        config: SyncConfig,
    ) -> Self {
        Self {
            repo,
            remote,
            bus,
            config: RwLock::new(config),
            syncing: AtomicBool::new(false),
            online: AtomicBool::new(true),
            dirty: AtomicBool::new(false),
            last_sync: RwLock::new(None),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Current engine state.
    pub fn state(&self) -> SyncState {
        if self.syncing.load(Ordering::SeqCst) {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> SyncConfig {
        self.config.read().clone()
    }

    /// The local repository this engine reads and writes.
    pub fn repo(&self) -> &Arc<LocalRepository<S>> {
        &self.repo
    }

    /// Replaces the configuration and re-persists it immediately.
    pub fn update_config(&self, config: SyncConfig) -> SyncResult<()> {
        config.save(&self.repo)?;
        *self.config.write() = config;
        Ok(())
    }

    /// Copy of the lifetime counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Snapshot for status displays.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            configured: self.config.read().is_configured(),
            syncing: self.syncing.load(Ordering::SeqCst),
            online: self.online.load(Ordering::SeqCst),
            dirty: self.dirty.load(Ordering::SeqCst),
            last_sync: *self.last_sync.read(),
        }
    }

    /// Records a connectivity transition and announces it on the bus.
    ///
    /// Going offline only suspends future scheduling; an already-dispatched
    /// network call completes or fails on its own.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            info!(online, "connectivity changed");
            self.bus.emit(Event::ConnectionChanged { online });
        }
    }

    /// Handles the "record set mutated" notification from the external
    /// record owner: touches the last-modified timestamp, journals the
    /// edit, and marks a change as pending so shutdown can flush it.
    pub fn notify_local_change(&self, now: DateTime<Utc>) -> SyncResult<()> {
        self.repo.record_change(now)?;
        self.dirty.store(true, Ordering::SeqCst);
        match self.repo.load_dataset() {
            Ok(dataset) => self.bus.emit(Event::LocalDataUpdated(dataset)),
            Err(e) => warn!(error = %e, "dataset unreadable after local change"),
        }
        Ok(())
    }

    /// Best-effort synchronous flush of a pending change, for shutdown.
    pub fn flush_pending(&self) {
        if !self.dirty.load(Ordering::SeqCst) {
            return;
        }
        debug!("flushing pending change before shutdown");
        if let Err(e) = self.sync_with_retry() {
            warn!(error = %e, "shutdown flush failed");
        }
    }

    /// Runs one sync cycle with linear-backoff retries.
    ///
    /// Returns `Ok(SyncOutcome::Skipped(_))` when the cycle was dropped
    /// (unconfigured, offline, or already in flight). After
    /// `retry_attempts` consecutive failures, emits exactly one terminal
    /// [`Event::SyncFailed`] and returns the final error; the counter
    /// starts fresh on the next trigger.
    pub fn sync_with_retry(&self) -> SyncResult<SyncOutcome> {
        let config = self.config.read().clone();
        if !config.is_configured() {
            debug!("sync skipped: not configured");
            return Ok(SyncOutcome::Skipped(SkipReason::NotConfigured));
        }
        if !self.online.load(Ordering::SeqCst) {
            debug!("sync skipped: offline");
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }
        if self.syncing.swap(true, Ordering::SeqCst) {
            debug!("sync skipped: already in flight");
            return Ok(SyncOutcome::Skipped(SkipReason::InFlight));
        }
        let _guard = InFlightGuard(&self.syncing);

        let attempts = config.retry_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.bus.emit(Event::SyncStarted);

            match self.sync_once(&config) {
                Ok(outcome) => {
                    *self.last_sync.write() = Some(Utc::now());
                    self.dirty.store(false, Ordering::SeqCst);

                    let mut stats = self.stats.write();
                    stats.cycles_completed += 1;
                    stats.last_error = None;
                    match outcome {
                        SyncOutcome::Pushed => stats.pushes += 1,
                        SyncOutcome::Merged { conflicts } => {
                            stats.merges += 1;
                            stats.conflicts_seen += conflicts as u64;
                        }
                        _ => {}
                    }
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "sync attempt failed");
                    if e.is_retryable() && attempt < attempts {
                        self.stats.write().retries += 1;
                        std::thread::sleep(config.retry_delay() * attempt);
                        continue;
                    }
                    self.stats.write().last_error = Some(e.to_string());
                    self.bus.emit(Event::SyncFailed {
                        error: e.to_string(),
                        retry_count: attempt,
                    });
                    return Err(e);
                }
            }
        }
    }

    /// One attempt: fetch, compare timestamps, push or merge.
    fn sync_once(&self, config: &SyncConfig) -> SyncResult<SyncOutcome> {
        let local = self.repo.load_dataset()?;
        let remote = self.remote.fetch()?;

        match local.last_modified.cmp(&remote.last_modified) {
            CmpOrdering::Greater => {
                // Last-writer-wins at dataset granularity: no per-record
                // merge on the push path.
                self.remote.replace(&local)?;
                info!(version = local.version, "pushed local dataset to remote");
                self.bus.emit(Event::SyncCompleted { conflict_count: 0 });
                Ok(SyncOutcome::Pushed)
            }
            CmpOrdering::Less => {
                let outcome =
                    resolver::merge_datasets(&local, &remote, config.strategy, Utc::now());
                self.repo.save_dataset(&outcome.dataset)?;
                info!(
                    version = outcome.dataset.version,
                    conflicts = outcome.conflicts.len(),
                    "applied remote dataset"
                );

                self.bus.emit(Event::LocalDataUpdated(outcome.dataset));
                let conflict_count = outcome.conflicts.len();
                if conflict_count > 0 {
                    self.bus.emit(Event::ConflictsDetected(outcome.conflicts));
                }
                self.bus.emit(Event::SyncCompleted { conflict_count });
                Ok(SyncOutcome::Merged {
                    conflicts: conflict_count,
                })
            }
            CmpOrdering::Equal => {
                debug!("timestamps equal, nothing to sync");
                Ok(SyncOutcome::NoChange)
            }
        }
    }
}

/// Releases the mutual-exclusion flag even when an attempt errors out.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
