//! Persisted configuration for the sync engine.

use crate::error::SyncResult;
use podium_core::LocalRepository;
use podium_model::MergeStrategy;
use podium_store::KvStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Configuration for sync operations.
///
/// Persisted as a JSON blob in the key-value namespace. Loaded once at
/// startup; mutated only through [`crate::SyncEngine::update_config`],
/// which re-persists immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Bearer credential for the remote document API.
    pub token: String,
    /// Identifier of the remote document.
    pub gist_id: String,
    /// Name of the data file inside the remote document.
    pub data_file_name: String,
    /// Base URL of the document API.
    pub api_base: String,
    /// Interval between automatic sync cycles, in milliseconds.
    pub auto_sync_interval_ms: u64,
    /// Maximum consecutive attempts per sync cycle.
    pub retry_attempts: u32,
    /// Base delay for linear backoff, in milliseconds (attempt `n` waits
    /// `n * retry_delay_ms`).
    pub retry_delay_ms: u64,
    /// How colliding records are resolved during a merge.
    pub strategy: MergeStrategy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            gist_id: String::new(),
            data_file_name: "speakers-data.json".to_owned(),
            api_base: "https://api.github.com/gists".to_owned(),
            auto_sync_interval_ms: 30_000,
            retry_attempts: 3,
            retry_delay_ms: 2_000,
            strategy: MergeStrategy::Merge,
        }
    }
}

impl SyncConfig {
    /// True when enough is configured to attempt a sync. Until then the
    /// engine skips cycles instead of erroring.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.gist_id.is_empty()
    }

    /// Interval between automatic sync cycles.
    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_millis(self.auto_sync_interval_ms)
    }

    /// Base delay for linear backoff.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Sets the credential.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the remote document identifier.
    pub fn with_gist_id(mut self, gist_id: impl Into<String>) -> Self {
        self.gist_id = gist_id.into();
        self
    }

    /// Sets the data file name.
    pub fn with_data_file_name(mut self, name: impl Into<String>) -> Self {
        self.data_file_name = name.into();
        self
    }

    /// Sets the auto-sync interval.
    pub fn with_auto_sync_interval(mut self, interval: Duration) -> Self {
        self.auto_sync_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the conflict-resolution strategy.
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Loads the persisted configuration, falling back to defaults when
    /// nothing is stored. An unparseable blob is logged and replaced by
    /// defaults rather than failing startup.
    pub fn load<S: KvStore>(repo: &LocalRepository<S>) -> SyncResult<Self> {
        match repo.sync_config_blob()? {
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!(error = %e, "sync config unparseable, using defaults");
                    Ok(Self::default())
                }
            },
            None => Ok(Self::default()),
        }
    }

    /// Persists the configuration.
    pub fn save<S: KvStore>(&self, repo: &LocalRepository<S>) -> SyncResult<()> {
        let blob = serde_json::to_string(self)?;
        repo.save_sync_config_blob(&blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_store::MemoryStore;

    #[test]
    fn defaults_are_not_configured() {
        let config = SyncConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.strategy, MergeStrategy::Merge);
    }

    #[test]
    fn builder_configures() {
        let config = SyncConfig::default()
            .with_token("tok")
            .with_gist_id("abc123")
            .with_retry(5, Duration::from_millis(100))
            .with_strategy(MergeStrategy::Remote);

        assert!(config.is_configured());
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.strategy, MergeStrategy::Remote);
    }

    #[test]
    fn persisted_roundtrip() {
        let repo = LocalRepository::new(MemoryStore::new());
        assert!(!SyncConfig::load(&repo).unwrap().is_configured());

        let config = SyncConfig::default().with_token("tok").with_gist_id("g1");
        config.save(&repo).unwrap();
        assert_eq!(SyncConfig::load(&repo).unwrap(), config);
    }

    #[test]
    fn garbage_blob_falls_back_to_defaults() {
        let repo = LocalRepository::new(MemoryStore::new());
        repo.save_sync_config_blob("]]]").unwrap();
        assert_eq!(SyncConfig::load(&repo).unwrap(), SyncConfig::default());
    }

    #[test]
    fn camel_case_wire_names() {
        let json = serde_json::to_value(SyncConfig::default()).unwrap();
        assert!(json.get("gistId").is_some());
        assert!(json.get("dataFileName").is_some());
        assert!(json.get("autoSyncIntervalMs").is_some());
        assert_eq!(json["strategy"], "merge");
    }
}
