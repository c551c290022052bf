//! # Podium Backup
//!
//! Snapshotting and durability protection for the Podium dataset.
//!
//! This crate provides:
//! - Full and incremental backups with checksum-carrying index entries
//! - Time-based retention that keeps payloads and index in lockstep
//! - Structural integrity checking with mechanical repair of id/name
//!   defects
//! - Corruption handling: emergency snapshot, then a restore candidate
//!   scanned newest-first from the index
//! - Restore (wholesale dataset replacement)
//! - A sync-consistency check that hands divergence to the sync engine
//!   instead of resolving it here

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod error;
mod manager;
mod scheduler;

pub mod integrity;

pub use backup::{Backup, BackupIndexEntry, BackupKind, BackupPayload};
pub use error::{BackupError, BackupResult};
pub use integrity::{CorruptionFlag, Severity};
pub use manager::{BackupConfig, BackupManager, BackupStatus, IntegrityReport};
pub use scheduler::BackupScheduler;
