//! `podium backup` - create, list, check, and restore backups.

use super::App;
use std::error::Error;

/// Creates a backup now.
pub fn create(app: &App, incremental: bool) -> Result<(), Box<dyn Error>> {
    if incremental {
        match app.manager.create_incremental_backup()? {
            Some(backup) => println!("Created incremental backup {}.", backup.id),
            None => println!("No journaled changes; nothing to back up."),
        }
    } else {
        let backup = app.manager.create_full_backup()?;
        println!("Created full backup {} (version {}).", backup.id, backup.version);
    }
    Ok(())
}

/// Lists stored backups, newest first.
pub fn list(app: &App) -> Result<(), Box<dyn Error>> {
    let index = app.manager.list_backups()?;
    if index.is_empty() {
        println!("No backups stored.");
        return Ok(());
    }

    for entry in index {
        println!(
            "{}  {:?}  version {}  checksum {:08x}  {}",
            entry.timestamp.to_rfc3339(),
            entry.kind,
            entry.version,
            entry.checksum,
            entry.id,
        );
    }
    Ok(())
}

/// Runs the integrity check and reports what it found.
pub fn check(app: &App) -> Result<(), Box<dyn Error>> {
    let report = app.manager.integrity_check()?;

    if report.is_clean() {
        println!("Integrity check passed.");
        return Ok(());
    }

    if report.unparseable {
        println!("Persisted dataset is not parseable.");
    }
    for flag in &report.flags {
        println!("  defect: {flag}");
    }
    if let Some(repaired) = &report.repaired {
        println!(
            "Repaired in place: {} ids assigned, {} names defaulted, {} duplicates reassigned.",
            repaired.assigned_ids, repaired.defaulted_names, repaired.reassigned_duplicates
        );
    }
    if let Some(candidate) = &report.restore_candidate {
        println!(
            "Not mechanically repairable. Restore candidate: {} from {} (version {}).",
            candidate.id,
            candidate.timestamp.to_rfc3339(),
            candidate.version
        );
        println!("Run `podium backup restore {}` to roll back.", candidate.id);
    }
    Ok(())
}

/// Replaces the live dataset with a backup's snapshot.
pub fn restore(app: &App, id: &str) -> Result<(), Box<dyn Error>> {
    let dataset = app.manager.restore(id)?;
    println!(
        "Restored {} speaker(s) at version {} from {}.",
        dataset.len(),
        dataset.version,
        id
    );
    Ok(())
}
