//! # Podium Sync Engine
//!
//! Keeps the local dataset and the remote document copy consistent under
//! intermittent connectivity.
//!
//! This crate provides:
//! - Remote store client (trait + gist-style HTTP implementation + mock)
//! - Pure field-level conflict resolver
//! - Sync engine (mutual-exclusion flag, linear retry/backoff, events)
//! - Auto-sync scheduler
//! - Persisted sync configuration
//!
//! ## Architecture
//!
//! The engine decides direction by comparing `last_modified` wall-clock
//! timestamps at dataset granularity:
//! 1. Local strictly newer: replace the remote document wholesale
//!    (last-writer-wins, no per-record merge)
//! 2. Remote strictly newer: merge record-by-record, persist locally,
//!    notify the record owner
//! 3. Equal: no-op
//!
//! ## Key Invariants
//!
//! - At most one sync attempt is in flight; extra triggers are dropped, not
//!   queued (the next periodic tick catches up)
//! - Transient failures retry with linear backoff up to the configured
//!   ceiling, then surface exactly one terminal failure event
//! - Wall-clock comparison means clock skew between clients can discard an
//!   apparently-older write; there is no cross-process coordination
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod gist;
mod remote;
mod scheduler;

pub mod resolver;

pub use config::SyncConfig;
pub use engine::{SkipReason, SyncEngine, SyncOutcome, SyncState, SyncStats, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use gist::{GistStore, HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestClient};
pub use remote::{MockRemoteStore, RemoteStore};
pub use scheduler::AutoSync;
