//! Backup scheduler.
//!
//! One worker thread owns the backup cadence: a full backup at startup and
//! on the configured interval, one integrity check after a short startup
//! delay, periodic sync-consistency checks, and an incremental backup for
//! every "data changed" notification. Every entry point catches, logs, and
//! continues - nothing here may take the process down.

use crate::manager::BackupManager;
use podium_core::{Event, EventBus};
use podium_store::KvStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the worker wakes to check deadlines and the shutdown flag.
const POLL_GRANULARITY: Duration = Duration::from_millis(250);

/// Drives the backup manager on a worker thread.
pub struct BackupScheduler {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BackupScheduler {
    /// Starts the scheduler for `manager`, subscribed to `bus`.
    pub fn start<S: KvStore + 'static>(
        manager: Arc<BackupManager<S>>,
        bus: &EventBus,
    ) -> Self {
        let receiver = bus.subscribe();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || run(manager, receiver, flag));

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signals the worker and joins it.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("backup worker panicked");
            }
        }
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run<S: KvStore>(
    manager: Arc<BackupManager<S>>,
    receiver: Receiver<Event>,
    shutdown: Arc<AtomicBool>,
) {
    let config = manager.config().clone();

    // Initial snapshot, like every startup.
    if let Err(e) = manager.create_full_backup() {
        warn!(error = %e, "startup backup failed");
    }

    let started = Instant::now();
    let mut integrity_due = Some(started + config.integrity_check_delay);
    let mut next_backup = started + config.backup_interval;
    let mut next_consistency = started + config.consistency_interval;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            debug!("backup worker stopping");
            return;
        }

        let now = Instant::now();
        if let Some(due) = integrity_due {
            if now >= due {
                integrity_due = None;
                match manager.integrity_check() {
                    Ok(report) if report.is_clean() => info!("integrity check passed"),
                    Ok(report) => warn!(
                        flags = report.flags.len(),
                        repaired = report.repaired.is_some(),
                        candidate = report.restore_candidate.is_some(),
                        "integrity check found defects"
                    ),
                    Err(e) => warn!(error = %e, "integrity check failed"),
                }
            }
        }
        if now >= next_backup {
            next_backup = now + config.backup_interval;
            if let Err(e) = manager.create_full_backup() {
                warn!(error = %e, "scheduled backup failed");
            }
        }
        if now >= next_consistency {
            next_consistency = now + config.consistency_interval;
            if let Err(e) = manager.check_sync_consistency() {
                warn!(error = %e, "consistency check failed");
            }
        }

        match receiver.recv_timeout(POLL_GRANULARITY) {
            Ok(Event::LocalDataUpdated(_)) => {
                if let Err(e) = manager.create_incremental_backup() {
                    warn!(error = %e, "incremental backup failed");
                }
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("event bus closed, backup worker stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::BackupConfig;
    use chrono::{TimeZone, Utc};
    use podium_core::LocalRepository;
    use podium_model::{Dataset, Record};
    use podium_store::MemoryStore;

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let end = Instant::now() + deadline;
        while Instant::now() < end {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        done()
    }

    #[test]
    fn startup_backup_and_clean_stop() {
        let repo = Arc::new(LocalRepository::new(MemoryStore::new()));
        let bus = Arc::new(EventBus::new());
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        repo.save_dataset(&Dataset::with_speakers(t, vec![Record::new(1, "Ada")]))
            .unwrap();

        let manager = Arc::new(BackupManager::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            BackupConfig::default().with_integrity_check_delay(Duration::from_secs(3600)),
        ));

        let scheduler = BackupScheduler::start(Arc::clone(&manager), &bus);
        assert!(wait_until(Duration::from_secs(2), || {
            manager.status().map(|s| s.total_backups >= 1).unwrap_or(false)
        }));
        scheduler.stop();
    }

    #[test]
    fn data_changed_event_cuts_an_incremental_backup() {
        let repo = Arc::new(LocalRepository::new(MemoryStore::new()));
        let bus = Arc::new(EventBus::new());
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let dataset = Dataset::with_speakers(t, vec![Record::new(1, "Ada")]);
        repo.save_dataset(&dataset).unwrap();

        let manager = Arc::new(BackupManager::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            BackupConfig::default().with_integrity_check_delay(Duration::from_secs(3600)),
        ));
        let scheduler = BackupScheduler::start(Arc::clone(&manager), &bus);

        // Wait out the startup full backup (which clears the journal).
        assert!(wait_until(Duration::from_secs(2), || {
            manager.status().map(|s| s.total_backups >= 1).unwrap_or(false)
        }));

        // An external edit, then the notification.
        repo.record_change(t + chrono::Duration::minutes(1)).unwrap();
        bus.emit(Event::LocalDataUpdated(dataset));

        assert!(wait_until(Duration::from_secs(2), || {
            manager
                .list_backups()
                .map(|index| index.iter().any(|e| e.id.starts_with("incremental-")))
                .unwrap_or(false)
        }));
        scheduler.stop();
    }
}
