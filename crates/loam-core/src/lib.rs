//! loam-core - Core library for Loam
//!
//! This crate contains the offline-first data-consistency layer shared by
//! every Loam interface: the syncable record schema, the local store with
//! live queries, the dirty tracker that gates all mutations, the cascade
//! rules for soft deletes, and the push-based sync engine.

pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod tracker;

pub use config::SyncConfig;
pub use db::{observe, Store};
pub use error::{Error, Result};
pub use models::{Patch, RecordId, SyncFlag, SyncMeta, Table};
pub use sync::{HttpSyncTransport, PushOutcome, SyncEngine};
pub use tracker::{mark_for_sync, Change};
