//! Podium CLI
//!
//! Command-line surface over the sync and backup core.
//!
//! # Commands
//!
//! - `status` - dataset, sync, and backup state at a glance
//! - `sync` - run one manual sync cycle
//! - `backup` - create, list, check, and restore backups
//! - `config` - show and update the sync configuration
//! - `watch` - run the auto-sync and backup schedulers until Enter

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Podium sync and backup tools.
#[derive(Parser)]
#[command(name = "podium")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store file
    #[arg(global = true, short, long, default_value = "podium-data.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dataset, sync, and backup status
    Status,

    /// Run one sync cycle now
    Sync,

    /// Backup and restore operations
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show or update the sync configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run the auto-sync and backup schedulers until Enter is pressed
    Watch,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Create a backup now
    Create {
        /// Drain the change journal into an incremental backup instead of
        /// snapshotting everything
        #[arg(short, long)]
        incremental: bool,
    },

    /// List stored backups, newest first
    List,

    /// Run the integrity check against the live dataset
    Check,

    /// Replace the live dataset with a backup's snapshot
    Restore {
        /// Backup identifier (see `backup list`)
        id: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,

    /// Update configuration fields and re-persist immediately
    Set {
        /// Bearer credential for the document API
        #[arg(long)]
        token: Option<String>,

        /// Remote document identifier
        #[arg(long)]
        gist_id: Option<String>,

        /// Data file name inside the document
        #[arg(long)]
        file_name: Option<String>,

        /// Auto-sync interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Maximum attempts per sync cycle
        #[arg(long)]
        retry_attempts: Option<u32>,

        /// Linear backoff base delay in milliseconds
        #[arg(long)]
        retry_delay_ms: Option<u64>,

        /// Conflict strategy: local, remote, or merge
        #[arg(long)]
        strategy: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = commands::App::build(&cli.store)?;

    match cli.command {
        Commands::Status => commands::status::run(&app)?,
        Commands::Sync => commands::sync::run(&app)?,
        Commands::Backup { action } => match action {
            BackupAction::Create { incremental } => commands::backup::create(&app, incremental)?,
            BackupAction::List => commands::backup::list(&app)?,
            BackupAction::Check => commands::backup::check(&app)?,
            BackupAction::Restore { id } => commands::backup::restore(&app, &id)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&app)?,
            ConfigAction::Set {
                token,
                gist_id,
                file_name,
                interval_ms,
                retry_attempts,
                retry_delay_ms,
                strategy,
            } => commands::config::set(
                &app,
                commands::config::Updates {
                    token,
                    gist_id,
                    file_name,
                    interval_ms,
                    retry_attempts,
                    retry_delay_ms,
                    strategy,
                },
            )?,
        },
        Commands::Watch => commands::watch::run(app)?,
    }

    Ok(())
}
