//! Poultry models: flocks and their dependent records

use serde::Serialize;

use super::{RecordId, SyncMeta};

/// A group of birds managed as one unit.
///
/// Deleting a flock soft-deletes its health records and feed logs in the
/// same transaction (see the cascade rules).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flock {
    /// Unique identifier
    pub id: RecordId,
    /// Display name, e.g. "Barn layers"
    pub name: String,
    /// Species or breed
    pub species: String,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

impl Flock {
    #[must_use]
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            species: species.into(),
            meta: SyncMeta::new(),
        }
    }
}

/// Partial update for a flock
#[derive(Debug, Clone, Default)]
pub struct FlockPatch {
    pub name: Option<String>,
    pub species: Option<String>,
}

/// A health or treatment entry for one flock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    pub id: RecordId,
    /// Parent flock
    pub flock_id: RecordId,
    /// What was observed or administered
    pub description: String,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

impl HealthRecord {
    #[must_use]
    pub fn new(flock_id: RecordId, description: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            flock_id,
            description: description.into(),
            meta: SyncMeta::new(),
        }
    }
}

/// Partial update for a health record
#[derive(Debug, Clone, Default)]
pub struct HealthRecordPatch {
    pub description: Option<String>,
}

/// A feed consumption entry for one flock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedLog {
    pub id: RecordId,
    /// Parent flock
    pub flock_id: RecordId,
    /// Feed kind, e.g. "layer pellets"
    pub feed_type: String,
    /// Quantity fed, in kilograms
    pub quantity_kg: f64,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

impl FeedLog {
    #[must_use]
    pub fn new(flock_id: RecordId, feed_type: impl Into<String>, quantity_kg: f64) -> Self {
        Self {
            id: RecordId::new(),
            flock_id,
            feed_type: feed_type.into(),
            quantity_kg,
            meta: SyncMeta::new(),
        }
    }
}

/// Partial update for a feed log
#[derive(Debug, Clone, Default)]
pub struct FeedLogPatch {
    pub feed_type: Option<String>,
    pub quantity_kg: Option<f64>,
}
