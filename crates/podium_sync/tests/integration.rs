//! Integration tests: full engines wired against a shared remote store.

use chrono::{DateTime, TimeZone, Utc};
use podium_core::{Event, EventBus, LocalRepository};
use podium_model::{Dataset, MergeStrategy, Record, SpeakerStatus};
use podium_store::MemoryStore;
use podium_sync::{MockRemoteStore, RemoteStore, SyncConfig, SyncEngine, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;

fn t(day: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, minute, 0).unwrap()
}

fn client(
    remote: &Arc<MockRemoteStore>,
    strategy: MergeStrategy,
) -> (Arc<SyncEngine<MemoryStore>>, Arc<EventBus>) {
    let repo = Arc::new(LocalRepository::new(MemoryStore::new()));
    let bus = Arc::new(EventBus::new());
    let remote_store: Arc<dyn RemoteStore> = remote.clone();
    let config = SyncConfig::default()
        .with_token("tok")
        .with_gist_id("g1")
        .with_retry(3, Duration::from_millis(1))
        .with_strategy(strategy);
    let engine = Arc::new(SyncEngine::new(repo, remote_store, Arc::clone(&bus), config));
    (engine, bus)
}

#[test]
fn two_clients_converge_through_the_remote() {
    let remote = Arc::new(MockRemoteStore::with_document({
        let mut d = Dataset::with_speakers(t(1, 0), vec![Record::new(1, "Ada")]);
        d.version = 1;
        d
    }));

    // Client A edits locally and pushes.
    let (a, _bus_a) = client(&remote, MergeStrategy::Merge);
    let mut a_data = Dataset::with_speakers(
        t(1, 5),
        vec![
            Record::new(1, "Ada").with_email("ada@x.com"),
            Record::new(2, "Grace").with_status(SpeakerStatus::Agreed),
        ],
    );
    a_data.version = 2;
    a.repo().save_dataset(&a_data).unwrap();
    assert_eq!(a.sync_with_retry().unwrap(), SyncOutcome::Pushed);

    // Client B, behind A, merges the pushed copy in.
    let (b, _bus_b) = client(&remote, MergeStrategy::Merge);
    let mut b_data = Dataset::with_speakers(t(1, 1), vec![Record::new(1, "Ada")]);
    b_data.version = 1;
    b.repo().save_dataset(&b_data).unwrap();

    match b.sync_with_retry().unwrap() {
        SyncOutcome::Merged { conflicts } => assert_eq!(conflicts, 1),
        other => panic!("expected merge, got {other:?}"),
    }

    let b_after = b.repo().load_dataset().unwrap();
    assert_eq!(b_after.len(), 2);
    assert_eq!(b_after.get(1).unwrap().email.as_deref(), Some("ada@x.com"));
    assert_eq!(b_after.get(2).unwrap().name, "Grace");
    // A pushed version 2, B was at 1: merged is max(1, 2) + 1.
    assert_eq!(b_after.version, 3);

    // B's merged copy is now newer than the remote; the next cycle pushes
    // and the system converges.
    assert_eq!(b.sync_with_retry().unwrap(), SyncOutcome::Pushed);
    assert_eq!(remote.fetch().unwrap(), b_after);
}

#[test]
fn concurrent_edits_keep_local_scalar_and_union_lists() {
    // The remote copy carries another client's edits, newer than ours.
    let remote = Arc::new(MockRemoteStore::with_document({
        let mut d = Dataset::with_speakers(
            t(2, 30),
            vec![Record::new(1, "Ada")
                .with_email("remote@x.com")
                .with_links(vec!["https://b.test".into()])],
        );
        d.version = 4;
        d
    }));

    let (engine, bus) = client(&remote, MergeStrategy::Merge);
    let rx = bus.subscribe();

    let mut local = Dataset::with_speakers(
        t(2, 0),
        vec![Record::new(1, "Ada")
            .with_email("local@x.com")
            .with_links(vec!["https://a.test".into()])],
    );
    local.version = 4;
    engine.repo().save_dataset(&local).unwrap();

    engine.sync_with_retry().unwrap();

    let merged = engine.repo().load_dataset().unwrap();
    let ada = merged.get(1).unwrap();
    assert_eq!(ada.email.as_deref(), Some("local@x.com"));
    assert_eq!(ada.links, vec!["https://a.test", "https://b.test"]);
    assert_eq!(merged.version, 5);

    let conflicts: Vec<Event> = rx
        .try_iter()
        .filter(|e| matches!(e, Event::ConflictsDetected(_)))
        .collect();
    assert_eq!(conflicts.len(), 1);
}

#[test]
fn remote_strategy_discards_local_side() {
    let remote = Arc::new(MockRemoteStore::with_document({
        let mut d = Dataset::with_speakers(
            t(3, 10),
            vec![Record::new(1, "Ada").with_email("remote@x.com")],
        );
        d.version = 2;
        d
    }));

    let (engine, _bus) = client(&remote, MergeStrategy::Remote);
    let mut local =
        Dataset::with_speakers(t(3, 0), vec![Record::new(1, "Ada").with_email("local@x.com")]);
    local.version = 2;
    engine.repo().save_dataset(&local).unwrap();

    engine.sync_with_retry().unwrap();
    assert_eq!(
        engine.repo().load_dataset().unwrap().get(1).unwrap().email.as_deref(),
        Some("remote@x.com")
    );
}

#[test]
fn transient_failure_recovers_within_budget() {
    let shared = Dataset::with_speakers(t(4, 0), vec![Record::new(1, "Ada")]);
    let remote = Arc::new(MockRemoteStore::with_document(shared.clone()));
    remote.fail_next_fetches(2);

    let (engine, bus) = client(&remote, MergeStrategy::Merge);
    let rx = bus.subscribe();
    engine.repo().save_dataset(&shared).unwrap();

    // Two failures, then success on the third and final attempt.
    assert_eq!(engine.sync_with_retry().unwrap(), SyncOutcome::NoChange);
    assert_eq!(remote.fetch_calls(), 3);
    assert_eq!(engine.stats().retries, 2);

    // No terminal failure event was emitted.
    assert!(!rx.try_iter().any(|e| matches!(e, Event::SyncFailed { .. })));
}
