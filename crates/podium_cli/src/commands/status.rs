//! `podium status` - dataset, sync, and backup state at a glance.

use super::App;
use std::error::Error;

/// Prints the status summary.
pub fn run(app: &App) -> Result<(), Box<dyn Error>> {
    let dataset = app.repo.load_dataset()?;
    println!("Dataset");
    println!("  version:       {}", dataset.version);
    println!("  speakers:      {}", dataset.len());
    println!("  last modified: {}", dataset.last_modified.to_rfc3339());

    let status = app.engine.status();
    println!("Sync");
    println!("  configured:    {}", status.configured);
    println!("  online:        {}", status.online);
    println!("  syncing:       {}", status.syncing);
    println!("  change pending:{}", if status.dirty { " yes" } else { " no" });
    match status.last_sync {
        Some(t) => println!("  last sync:     {}", t.to_rfc3339()),
        None => println!("  last sync:     never"),
    }

    let stats = app.engine.stats();
    println!(
        "  cycles: {} (pushes {}, merges {}, conflicts {}, retries {})",
        stats.cycles_completed, stats.pushes, stats.merges, stats.conflicts_seen, stats.retries
    );
    if let Some(error) = stats.last_error {
        println!("  last error:    {error}");
    }

    let backups = app.manager.status()?;
    println!("Backups");
    println!("  stored:        {}", backups.total_backups);
    match backups.last_backup {
        Some(t) => println!("  newest:        {}", t.to_rfc3339()),
        None => println!("  newest:        none"),
    }
    println!("  disk usage:    {} bytes", backups.disk_usage_bytes);

    Ok(())
}
