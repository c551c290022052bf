//! Typed event bus wiring the core components together.
//!
//! The bus distributes lifecycle events to subscribers:
//! - the external record owner reloads on `LocalDataUpdated`
//! - the backup manager cuts an incremental backup on `LocalDataUpdated`
//! - the auto-sync scheduler runs a cycle on `LocalDataUpdated`,
//!   `ConnectionChanged { online: true }`, and `SyncRequested`
//!
//! One enum over per-subscriber channels keeps dispatch typed and preserves
//! cross-kind ordering for each subscriber.

use parking_lot::RwLock;
use podium_model::{Conflict, Dataset};
use std::sync::mpsc::{self, Receiver, Sender};

/// A lifecycle event emitted by the sync engine or the backup manager.
#[derive(Debug, Clone)]
pub enum Event {
    /// The persisted dataset was replaced (remote data applied, repair, or
    /// restore). Carries the new dataset so the owner can reload without a
    /// second read.
    LocalDataUpdated(Dataset),
    /// A sync attempt started.
    SyncStarted,
    /// A sync cycle completed and something was pushed or applied.
    SyncCompleted {
        /// Number of conflicts resolved during the cycle.
        conflict_count: usize,
    },
    /// A sync cycle exhausted its retry budget.
    SyncFailed {
        /// Description of the final error.
        error: String,
        /// How many attempts were made.
        retry_count: u32,
    },
    /// Network connectivity changed.
    ConnectionChanged {
        /// Whether the client is now online.
        online: bool,
    },
    /// A merge produced field-level conflicts.
    ConflictsDetected(Vec<Conflict>),
    /// Someone (the backup manager's consistency check) wants an
    /// out-of-band sync cycle.
    SyncRequested,
    /// A backup was stored.
    BackupCreated {
        /// Identifier of the new backup.
        id: String,
    },
}

/// Distributes events to subscribers.
///
/// Each subscriber gets its own channel; events are cloned per subscriber
/// and delivered in emit order. Disconnected subscribers are dropped on the
/// next emit.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Creates a new bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all live subscribers.
    pub fn emit(&self, event: Event) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last emit).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn emit_and_receive_in_order() {
        let bus = EventBus::new();
        let rx = bus.subscribe();

        bus.emit(Event::SyncStarted);
        bus.emit(Event::SyncCompleted { conflict_count: 2 });

        assert!(matches!(rx.recv().unwrap(), Event::SyncStarted));
        assert!(matches!(
            rx.recv().unwrap(),
            Event::SyncCompleted { conflict_count: 2 }
        ));
    }

    #[test]
    fn multiple_subscribers_each_get_a_copy() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        let dataset = Dataset::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        bus.emit(Event::LocalDataUpdated(dataset.clone()));

        for rx in [rx1, rx2] {
            match rx.recv().unwrap() {
                Event::LocalDataUpdated(d) => assert_eq!(d, dataset),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn dropped_subscriber_is_cleaned_up() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(rx);
        bus.emit(Event::SyncStarted);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
