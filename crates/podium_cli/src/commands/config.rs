//! `podium config` - show and update the sync configuration.

use super::App;
use std::error::Error;
use std::time::Duration;

/// Optional field updates from the command line.
pub struct Updates {
    /// New credential.
    pub token: Option<String>,
    /// New document identifier.
    pub gist_id: Option<String>,
    /// New data file name.
    pub file_name: Option<String>,
    /// New auto-sync interval in milliseconds.
    pub interval_ms: Option<u64>,
    /// New retry ceiling.
    pub retry_attempts: Option<u32>,
    /// New backoff base delay in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// New conflict strategy.
    pub strategy: Option<String>,
}

/// Prints the current configuration with the credential redacted.
pub fn show(app: &App) -> Result<(), Box<dyn Error>> {
    let config = app.engine.config();
    println!("token:            {}", redact(&config.token));
    println!("gist id:          {}", display_or_unset(&config.gist_id));
    println!("data file:        {}", config.data_file_name);
    println!("api base:         {}", config.api_base);
    println!("sync interval:    {} ms", config.auto_sync_interval_ms);
    println!("retry attempts:   {}", config.retry_attempts);
    println!("retry delay:      {} ms", config.retry_delay_ms);
    println!("strategy:         {:?}", config.strategy);
    println!("configured:       {}", config.is_configured());
    Ok(())
}

/// Applies updates and re-persists immediately.
pub fn set(app: &App, updates: Updates) -> Result<(), Box<dyn Error>> {
    let mut config = app.engine.config();

    if let Some(token) = updates.token {
        config = config.with_token(token);
    }
    if let Some(gist_id) = updates.gist_id {
        config = config.with_gist_id(gist_id);
    }
    if let Some(file_name) = updates.file_name {
        config = config.with_data_file_name(file_name);
    }
    if let Some(interval_ms) = updates.interval_ms {
        config = config.with_auto_sync_interval(Duration::from_millis(interval_ms));
    }
    if updates.retry_attempts.is_some() || updates.retry_delay_ms.is_some() {
        let attempts = updates.retry_attempts.unwrap_or(config.retry_attempts);
        let delay = updates
            .retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.retry_delay());
        config = config.with_retry(attempts, delay);
    }
    if let Some(strategy) = updates.strategy {
        config = config.with_strategy(strategy.parse()?);
    }

    app.engine.update_config(config)?;
    println!("Configuration saved.");
    Ok(())
}

fn redact(token: &str) -> String {
    if token.is_empty() {
        "(unset)".to_owned()
    } else {
        format!("{}... ({} chars)", &token[..token.len().min(4)], token.len())
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
