//! Data models for Loam
//!
//! Every entity embeds [`SyncMeta`] and is addressed by a [`RecordId`]; the
//! set of tables is closed and typed so no call site dispatches on raw
//! strings.

mod flock;
mod meta;
mod seed;

use std::fmt;

use rusqlite::types::Value;

pub use flock::{FeedLog, FeedLogPatch, Flock, FlockPatch, HealthRecord, HealthRecordPatch};
pub use meta::{RecordId, SyncFlag, SyncMeta};
pub use seed::{PlantingLog, PlantingLogPatch, SeedBatch, SeedBatchPatch};

/// The closed set of entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Flocks,
    HealthRecords,
    FeedLogs,
    SeedBatches,
    PlantingLogs,
}

impl Table {
    /// All tables, in push-batch order
    pub const ALL: [Self; 5] = [
        Self::Flocks,
        Self::HealthRecords,
        Self::FeedLogs,
        Self::SeedBatches,
        Self::PlantingLogs,
    ];

    /// SQL table name / push-batch key
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flocks => "flocks",
            Self::HealthRecords => "health_records",
            Self::FeedLogs => "feed_logs",
            Self::SeedBatches => "seed_batches",
            Self::PlantingLogs => "planting_logs",
        }
    }

    /// Resolve a push-batch key back to a table
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.name() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed partial update for exactly one table.
///
/// This is the only shape of field change the dirty tracker accepts, so
/// every mutation stays auditable without stringly-typed patch maps.
#[derive(Debug, Clone)]
pub enum Patch {
    Flock(FlockPatch),
    HealthRecord(HealthRecordPatch),
    FeedLog(FeedLogPatch),
    SeedBatch(SeedBatchPatch),
    PlantingLog(PlantingLogPatch),
}

impl Patch {
    /// The table this patch applies to
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Flock(_) => Table::Flocks,
            Self::HealthRecord(_) => Table::HealthRecords,
            Self::FeedLog(_) => Table::FeedLogs,
            Self::SeedBatch(_) => Table::SeedBatches,
            Self::PlantingLog(_) => Table::PlantingLogs,
        }
    }

    /// Column assignments for the fields actually present in the patch.
    ///
    /// An empty list is valid: the tracker still restamps the sync metadata.
    pub(crate) fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut set = Vec::new();
        match self {
            Self::Flock(p) => {
                push_text(&mut set, "name", p.name.as_ref());
                push_text(&mut set, "species", p.species.as_ref());
            }
            Self::HealthRecord(p) => {
                push_text(&mut set, "description", p.description.as_ref());
            }
            Self::FeedLog(p) => {
                push_text(&mut set, "feed_type", p.feed_type.as_ref());
                push_real(&mut set, "quantity_kg", p.quantity_kg);
            }
            Self::SeedBatch(p) => {
                push_text(&mut set, "crop", p.crop.as_ref());
                push_real(&mut set, "quantity_kg", p.quantity_kg);
            }
            Self::PlantingLog(p) => {
                push_text(&mut set, "field", p.field.as_ref());
                push_real(&mut set, "quantity_kg", p.quantity_kg);
            }
        }
        set
    }
}

fn push_text(set: &mut Vec<(&'static str, Value)>, column: &'static str, value: Option<&String>) {
    if let Some(value) = value {
        set.push((column, Value::Text(value.clone())));
    }
}

fn push_real(set: &mut Vec<(&'static str, Value)>, column: &'static str, value: Option<f64>) {
    if let Some(value) = value {
        set.push((column, Value::Real(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_name_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.name()), Some(table));
        }
        assert_eq!(Table::from_name("unknown"), None);
    }

    #[test]
    fn test_patch_assignments_skip_absent_fields() {
        let patch = Patch::Flock(FlockPatch {
            name: Some("Barn layers".to_string()),
            species: None,
        });
        let set = patch.assignments();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].0, "name");
    }

    #[test]
    fn test_empty_patch_has_no_assignments() {
        let patch = Patch::SeedBatch(SeedBatchPatch::default());
        assert!(patch.assignments().is_empty());
        assert_eq!(patch.table(), Table::SeedBatches);
    }
}
