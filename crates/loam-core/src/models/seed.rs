//! Crop input models: seed batches and planting logs

use serde::Serialize;

use super::{RecordId, SyncMeta};

/// A purchased or saved batch of seed, tracked as inventory.
///
/// A batch cannot be deleted while live planting logs still reference it;
/// those logs must be resolved or reassigned first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedBatch {
    pub id: RecordId,
    /// Crop name, e.g. "maize"
    pub crop: String,
    /// Remaining quantity, in kilograms
    pub quantity_kg: f64,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

impl SeedBatch {
    #[must_use]
    pub fn new(crop: impl Into<String>, quantity_kg: f64) -> Self {
        Self {
            id: RecordId::new(),
            crop: crop.into(),
            quantity_kg,
            meta: SyncMeta::new(),
        }
    }
}

/// Partial update for a seed batch.
///
/// NOTE: callers that deduct `quantity_kg` when recording a planting do so
/// as a separate tracked write; concurrent local edits to the same batch can
/// lose one of the deductions.
#[derive(Debug, Clone, Default)]
pub struct SeedBatchPatch {
    pub crop: Option<String>,
    pub quantity_kg: Option<f64>,
}

/// A sowing event consuming seed from one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantingLog {
    pub id: RecordId,
    /// Source seed batch
    pub seed_batch_id: RecordId,
    /// Field or bed identifier
    pub field: String,
    /// Seed consumed, in kilograms
    pub quantity_kg: f64,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

impl PlantingLog {
    #[must_use]
    pub fn new(seed_batch_id: RecordId, field: impl Into<String>, quantity_kg: f64) -> Self {
        Self {
            id: RecordId::new(),
            seed_batch_id,
            field: field.into(),
            quantity_kg,
            meta: SyncMeta::new(),
        }
    }
}

/// Partial update for a planting log
#[derive(Debug, Clone, Default)]
pub struct PlantingLogPatch {
    pub field: Option<String>,
    pub quantity_kg: Option<f64>,
}
