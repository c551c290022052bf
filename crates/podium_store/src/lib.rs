//! # Podium Store
//!
//! Opaque local key-value storage for Podium.
//!
//! Backends are **opaque string stores**: they hold keys and values and know
//! nothing about datasets, backups, or sync configuration. All
//! interpretation of the namespace lives above, in `podium_core`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::KvStore;
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
