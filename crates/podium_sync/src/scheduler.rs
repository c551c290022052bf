//! Auto-sync scheduler.
//!
//! One background thread routes every sync trigger through the engine: the
//! recurring interval tick, "data changed" notifications, the back-online
//! transition, and out-of-band requests from the consistency checker. The
//! engine's own mutual-exclusion flag keeps overlapping triggers harmless.

use crate::engine::SyncEngine;
use podium_core::{Event, EventBus};
use podium_store::KvStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often the worker wakes to check the shutdown flag and tick deadline.
const POLL_GRANULARITY: Duration = Duration::from_millis(250);

/// Drives periodic and event-triggered sync cycles on a worker thread.
///
/// Dropping the handle (or calling [`AutoSync::stop`]) signals the worker,
/// which performs one best-effort flush of a pending change and exits.
pub struct AutoSync {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSync {
    /// Starts the scheduler for `engine`, subscribed to `bus`.
    ///
    /// An initial sync cycle runs shortly after startup; after that, cycles
    /// run on the configured interval and on triggering events. The
    /// interval is re-read from the engine each pass, so configuration
    /// updates take effect without a restart.
    pub fn start<S: KvStore + 'static>(engine: Arc<SyncEngine<S>>, bus: &EventBus) -> Self {
        let receiver = bus.subscribe();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || run(engine, receiver, flag));

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signals the worker, flushes any pending change, and joins.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto-sync worker panicked");
            }
        }
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run<S: KvStore>(
    engine: Arc<SyncEngine<S>>,
    receiver: Receiver<Event>,
    shutdown: Arc<AtomicBool>,
) {
    let mut next_tick = Instant::now() + engine.config().auto_sync_interval();
    // One cycle right after startup, before the first interval elapses.
    let mut pending = true;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            engine.flush_pending();
            debug!("auto-sync worker stopping");
            return;
        }

        if pending {
            pending = false;
            run_cycle(&engine);
            next_tick = Instant::now() + engine.config().auto_sync_interval();
        }

        let wait = next_tick
            .saturating_duration_since(Instant::now())
            .min(POLL_GRANULARITY);
        match receiver.recv_timeout(wait) {
            Ok(Event::LocalDataUpdated(_)) | Ok(Event::SyncRequested) => pending = true,
            Ok(Event::ConnectionChanged { online: true }) => pending = true,
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {
                if Instant::now() >= next_tick {
                    pending = true;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                // The bus is gone; the application is tearing down.
                engine.flush_pending();
                debug!("event bus closed, auto-sync worker stopping");
                return;
            }
        }
    }
}

fn run_cycle<S: KvStore>(engine: &Arc<SyncEngine<S>>) {
    // Errors are already counted and announced by the engine; the worker
    // must outlive any single failure.
    match engine.sync_with_retry() {
        Ok(outcome) => debug!(?outcome, "sync cycle finished"),
        Err(e) => warn!(error = %e, "sync cycle failed"),
    }
}
