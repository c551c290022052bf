//! `podium sync` - one manual sync cycle.

use super::App;
use podium_core::Event;
use podium_sync::{SkipReason, SyncOutcome};
use std::error::Error;

/// Runs one sync cycle and reports the outcome.
pub fn run(app: &App) -> Result<(), Box<dyn Error>> {
    let receiver = app.bus.subscribe();

    match app.engine.sync_with_retry() {
        Ok(SyncOutcome::Pushed) => println!("Pushed local dataset to the remote store."),
        Ok(SyncOutcome::Merged { conflicts }) => {
            println!("Applied remote dataset ({conflicts} conflict(s) resolved).");
        }
        Ok(SyncOutcome::NoChange) => println!("Already in sync."),
        Ok(SyncOutcome::Skipped(SkipReason::NotConfigured)) => {
            println!("Sync not configured; run `podium config set --token ... --gist-id ...`.");
        }
        Ok(SyncOutcome::Skipped(reason)) => println!("Sync skipped: {reason:?}."),
        Err(e) => println!("Sync failed: {e}"),
    }

    for event in receiver.try_iter() {
        if let Event::ConflictsDetected(conflicts) = event {
            for conflict in conflicts {
                println!(
                    "conflict on #{} {:?}: {}",
                    conflict.record_id,
                    conflict.record_name,
                    conflict
                        .differences
                        .iter()
                        .map(|d| d.field.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
    }

    Ok(())
}
