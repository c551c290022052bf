//! `podium watch` - run the schedulers until Enter is pressed.

use super::App;
use podium_backup::BackupScheduler;
use podium_sync::AutoSync;
use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;

/// Runs auto-sync and the backup schedule until the user presses Enter,
/// then shuts both down cleanly (including the pending-change flush).
pub fn run(app: App) -> Result<(), Box<dyn Error>> {
    let auto_sync = AutoSync::start(Arc::clone(&app.engine), &app.bus);
    let backups = BackupScheduler::start(Arc::clone(&app.manager), &app.bus);

    println!("Watching for changes; press Enter to stop.");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    println!("Stopping...");
    auto_sync.stop();
    backups.stop();
    Ok(())
}
