//! # Podium Core
//!
//! Interpretation layer over the opaque key-value store.
//!
//! This crate provides:
//! - [`LocalRepository`]: typed accessors for the shared key-value
//!   namespace (dataset, sync configuration, backups, journal)
//! - [`ChangeEntry`]: the append-only change journal consumed by
//!   incremental backups
//! - [`EventBus`]: typed publish/subscribe wiring the sync engine, the
//!   backup manager, and the external record owner together

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod events;
mod journal;
mod repo;

pub use error::{CoreError, CoreResult};
pub use events::{Event, EventBus};
pub use journal::{ChangeEntry, ChangeKind};
pub use repo::{keys, LocalRepository};
