//! The sync engine: pushes locally dirty records to the remote system of
//! record and applies its acknowledgments.
//!
//! The engine never fails the caller. Network loss, auth failure, and
//! server-side rejection all resolve the same way: affected records stay
//! dirty and are retried on the next cycle, and the details come back as
//! structured errors in the [`PushOutcome`]. Conflicts between devices are
//! adjudicated remotely, last-writer-wins on `_last_modified` at
//! whole-record granularity; no field-level merge is attempted.

mod http;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Entity, Store, SyncAck};
use crate::error::Result;
use crate::models::{FeedLog, Flock, HealthRecord, PlantingLog, RecordId, SeedBatch, Table};

pub use http::HttpSyncTransport;

/// A dirty record captured for one push cycle
#[derive(Debug, Clone)]
pub struct PushRecord {
    pub table: Table,
    pub id: RecordId,
    /// Clock value at capture time; the acknowledgment guard key
    pub last_modified: i64,
    /// Full record payload, soft-delete fields included
    pub payload: serde_json::Value,
}

/// One outbound batch: every dirty record, grouped per table, giving the
/// remote side a consistent snapshot in a single round trip
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushBatch {
    pub tables: BTreeMap<String, Vec<serde_json::Value>>,
}

impl PushBatch {
    fn from_records(records: &[PushRecord]) -> Self {
        let mut tables: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
        for record in records {
            tables
                .entry(record.table.name().to_string())
                .or_default()
                .push(record.payload.clone());
        }
        Self { tables }
    }

    /// Total records in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-record verdict from the remote system
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResult {
    pub table: String,
    pub id: String,
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response to a push: one verdict per transmitted record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushResponse {
    pub results: Vec<RecordResult>,
}

/// Transport-level failures, distinct from per-record rejections
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error: {0}")]
    Api(String),
    #[error("Invalid sync response payload: {0}")]
    InvalidPayload(String),
}

/// How a push batch reaches the remote system.
///
/// The engine is generic over this so tests drive it with an in-memory
/// double instead of a network.
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    async fn push(&self, batch: &PushBatch) -> std::result::Result<PushResponse, TransportError>;
}

/// One record's failure within an otherwise non-fatal push cycle
#[derive(Debug, Error)]
pub enum SyncError {
    /// The whole batch failed to transmit; everything stays dirty
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server refused this record; blind retry will not fix it
    #[error("{table}/{id} rejected by server: {reason}")]
    Rejected {
        table: String,
        id: String,
        reason: String,
    },
    /// The server response never mentioned this record
    #[error("{table}/{id} was pushed but not acknowledged")]
    Unacknowledged { table: Table, id: RecordId },
    /// Local store failure while scanning or applying acknowledgments
    #[error("local store error during sync: {0}")]
    Store(String),
}

/// Aggregate result of one push cycle.
///
/// Partial failure is an expected outcome under intermittent connectivity,
/// not a fatal one; whatever stayed dirty is retried next cycle.
#[derive(Debug)]
pub struct PushOutcome {
    pub success: bool,
    pub errors: Vec<SyncError>,
}

impl PushOutcome {
    fn from_errors(errors: Vec<SyncError>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
        }
    }
}

/// Pushes dirty records and reconciles acknowledgments.
///
/// Safe to trigger repeatedly: after every save, on reconnect, on a timer.
/// There is no persistent in-flight state; a failed cycle changes nothing
/// and the next one retries from scratch.
pub struct SyncEngine<T: SyncTransport> {
    store: Arc<Store>,
    transport: T,
}

impl<T: SyncTransport> SyncEngine<T> {
    pub const fn new(store: Arc<Store>, transport: T) -> Self {
        Self { store, transport }
    }

    /// Run one push cycle. Never returns `Err`; see [`PushOutcome`].
    pub async fn request_push_changes(&self) -> PushOutcome {
        let dirty = match collect_dirty(&self.store) {
            Ok(dirty) => dirty,
            Err(e) => return PushOutcome::from_errors(vec![SyncError::Store(e.to_string())]),
        };
        if dirty.is_empty() {
            return PushOutcome::from_errors(Vec::new());
        }

        let batch = PushBatch::from_records(&dirty);
        tracing::debug!(records = batch.len(), "pushing local changes");

        let response = match self.transport.push(&batch).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("push failed, records stay dirty: {e}");
                return PushOutcome::from_errors(vec![SyncError::Transport(e.to_string())]);
            }
        };

        self.reconcile(dirty, response)
    }

    /// Match server verdicts against what was pushed and clear sync flags
    /// for the accepted records.
    fn reconcile(&self, dirty: Vec<PushRecord>, response: PushResponse) -> PushOutcome {
        let mut pending: BTreeMap<(String, String), PushRecord> = dirty
            .into_iter()
            .map(|record| ((record.table.name().to_string(), record.id.as_str()), record))
            .collect();

        let mut errors = Vec::new();
        let mut acks = Vec::new();
        for verdict in response.results {
            let Some(record) = pending.remove(&(verdict.table.clone(), verdict.id.clone()))
            else {
                tracing::warn!(
                    table = %verdict.table,
                    id = %verdict.id,
                    "server acknowledged a record we did not push"
                );
                continue;
            };
            if verdict.accepted {
                acks.push(SyncAck {
                    table: record.table,
                    id: record.id,
                    last_modified: record.last_modified,
                });
            } else {
                errors.push(SyncError::Rejected {
                    table: verdict.table,
                    id: verdict.id,
                    reason: verdict
                        .reason
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }
        }

        // Anything the server never mentioned stays dirty for retry.
        for record in pending.into_values() {
            errors.push(SyncError::Unacknowledged {
                table: record.table,
                id: record.id,
            });
        }

        match self.store.mark_synced_batch(&acks) {
            Ok(cleared) => {
                tracing::debug!(acknowledged = acks.len(), cleared, "applied server acks");
            }
            Err(e) => errors.push(SyncError::Store(e.to_string())),
        }

        PushOutcome::from_errors(errors)
    }

    /// Push on a fixed interval until the task is cancelled
    pub async fn run_on_interval(&self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let outcome = self.request_push_changes().await;
            if !outcome.success {
                for error in &outcome.errors {
                    tracing::warn!("background push: {error}");
                }
            }
        }
    }
}

/// Scan every table for records awaiting confirmation
fn collect_dirty(store: &Store) -> Result<Vec<PushRecord>> {
    let mut records = Vec::new();
    collect_table::<Flock>(store, &mut records)?;
    collect_table::<HealthRecord>(store, &mut records)?;
    collect_table::<FeedLog>(store, &mut records)?;
    collect_table::<SeedBatch>(store, &mut records)?;
    collect_table::<PlantingLog>(store, &mut records)?;
    Ok(records)
}

fn collect_table<E: Entity>(store: &Store, records: &mut Vec<PushRecord>) -> Result<()> {
    for entity in store.dirty::<E>()? {
        records.push(PushRecord {
            table: E::TABLE,
            id: entity.id(),
            last_modified: entity.meta().last_modified,
            payload: serde_json::to_value(&entity)?,
        });
    }
    Ok(())
}
