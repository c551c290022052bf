//! Subcommand implementations.

pub mod backup;
pub mod config;
pub mod status;
pub mod sync;
pub mod watch;

use podium_backup::{BackupConfig, BackupManager};
use podium_core::{EventBus, LocalRepository};
use podium_store::FileStore;
use podium_sync::{GistStore, RemoteStore, ReqwestClient, SyncConfig, SyncEngine};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

/// The composition root: every component constructed once and wired
/// together by reference, no globals.
pub struct App {
    /// Shared repository over the store file.
    pub repo: Arc<LocalRepository<FileStore>>,
    /// Shared event bus.
    pub bus: Arc<EventBus>,
    /// The sync engine.
    pub engine: Arc<SyncEngine<FileStore>>,
    /// The backup manager.
    pub manager: Arc<BackupManager<FileStore>>,
}

impl App {
    /// Opens the store and wires the engine and backup manager.
    pub fn build(store_path: &Path) -> Result<Self, Box<dyn Error>> {
        let store = FileStore::open(store_path)?;
        let repo = Arc::new(LocalRepository::new(store));
        let bus = Arc::new(EventBus::new());

        let config = SyncConfig::load(&repo)?;
        let remote: Arc<dyn RemoteStore> =
            Arc::new(GistStore::new(&config, ReqwestClient::new()?));

        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&repo),
            Arc::clone(&remote),
            Arc::clone(&bus),
            config.clone(),
        ));

        let manager = Arc::new(BackupManager::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            BackupConfig::default(),
        ));
        if config.is_configured() {
            manager.set_remote(remote);
        }

        Ok(Self {
            repo,
            bus,
            engine,
            manager,
        })
    }
}
