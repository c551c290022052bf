//! # Podium Model
//!
//! Data model for the Podium replication core.
//!
//! This crate provides:
//! - Speaker records and the status enumeration
//! - Datasets (record collection + version/timestamp bookkeeping)
//! - Field-level diff value objects (conflicts)
//! - Canonical JSON form and the 32-bit rolling checksum
//!
//! Everything here is pure data: no I/O, no clocks. Callers pass timestamps
//! in explicitly, which keeps the merge and checksum paths deterministic and
//! easy to test.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod dataset;
mod error;
mod record;

pub use checksum::{checksum32, dataset_checksum, value_checksum};
pub use dataset::Dataset;
pub use error::{ModelError, ModelResult};
pub use record::{Conflict, FieldDiff, FieldName, FieldValue, MergeStrategy, Record, SpeakerStatus};
