//! The dirty tracker: the single mutation gateway for existing records.
//!
//! Every edit and every deletion goes through [`mark_for_sync`], which
//! applies the change and restamps the sync metadata in one transaction.
//! Deletion is always a soft delete, with the cascade rules applied in the
//! same transaction. Only the sync engine may ever move a record back to
//! the synced state.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Transaction};

use crate::cascade::{self, CascadeAction};
use crate::db::{ChangeKind, Store};
use crate::error::{Error, Result};
use crate::models::{Patch, RecordId, Table};

/// A single tracked mutation: a typed partial update, or a soft delete
#[derive(Debug, Clone)]
pub enum Change {
    Update(Patch),
    Delete { table: Table },
}

impl Change {
    /// The table this change targets
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Update(patch) => patch.table(),
            Self::Delete { table } => *table,
        }
    }
}

/// Apply one tracked mutation to the record with the given id.
///
/// Always stamps `updated_at`, bumps `last_modified` monotonically, and
/// resets the sync flag to dirty, atomically with the change itself.
/// Fails with `NotFound` if the id is absent from the table, and with
/// `Conflict` (writing nothing) if deletion is blocked by live dependents.
pub fn mark_for_sync(store: &Store, id: &RecordId, change: Change) -> Result<()> {
    let table = change.table();
    let mut events = Vec::new();
    {
        let mut conn = store.lock();
        let tx = conn.transaction()?;

        let prev = previous_last_modified(&tx, table, id)?;
        let now = Utc::now();
        // Strictly increasing per record, even when the wall clock stalls
        // within one millisecond.
        let last_modified = now.timestamp_millis().max(prev + 1);

        match change {
            Change::Update(patch) => {
                apply_patch(&tx, id, &patch, now, last_modified)?;
                events.push((table, ChangeKind::Updated));
            }
            Change::Delete { .. } => {
                soft_delete(&tx, table, id, now, last_modified, &mut events)?;
            }
        }

        tx.commit()?;
    }

    for (table, kind) in events {
        store.publish(table, kind);
    }
    Ok(())
}

/// Read the target's current clock value, soft-deleted rows included
fn previous_last_modified(tx: &Transaction<'_>, table: Table, id: &RecordId) -> Result<i64> {
    let sql = format!("SELECT last_modified FROM {table} WHERE id = ?");
    match tx.query_row(&sql, params![id.as_str()], |row| row.get(0)) {
        Ok(value) => Ok(value),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound {
            table,
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn apply_patch(
    tx: &Transaction<'_>,
    id: &RecordId,
    patch: &Patch,
    now: DateTime<Utc>,
    last_modified: i64,
) -> Result<()> {
    let mut sql = format!("UPDATE {} SET ", patch.table());
    let mut values: Vec<Value> = Vec::new();
    for (column, value) in patch.assignments() {
        sql.push_str(column);
        sql.push_str(" = ?, ");
        values.push(value);
    }
    sql.push_str("updated_at = ?, last_modified = ?, synced = 0 WHERE id = ?");
    values.push(Value::Text(now.to_rfc3339()));
    values.push(Value::Integer(last_modified));
    values.push(Value::Text(id.as_str()));

    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

/// Soft-delete the parent and resolve its cascade rules.
///
/// Blocking rules are checked before anything is written; cascading
/// children share the parent's `deleted_at` and are stamped dirty with
/// their own monotonic clock bump.
fn soft_delete(
    tx: &Transaction<'_>,
    table: Table,
    id: &RecordId,
    now: DateTime<Utc>,
    last_modified: i64,
    events: &mut Vec<(Table, ChangeKind)>,
) -> Result<()> {
    let rules = cascade::rules(table);

    for rule in rules {
        if rule.action == CascadeAction::Block {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ? AND is_deleted = 0",
                rule.child, rule.fk_column
            );
            let dependents: i64 = tx.query_row(&sql, params![id.as_str()], |row| row.get(0))?;
            if dependents > 0 {
                return Err(Error::Conflict {
                    table,
                    dependent_table: rule.child,
                    dependents: usize::try_from(dependents).unwrap_or(usize::MAX),
                });
            }
        }
    }

    let deleted_at = now.to_rfc3339();
    for rule in rules {
        if rule.action == CascadeAction::SoftDelete {
            let sql = format!(
                "UPDATE {} SET is_deleted = 1, deleted_at = ?1, updated_at = ?1,
                 last_modified = MAX(?2, last_modified + 1), synced = 0
                 WHERE {} = ?3 AND is_deleted = 0",
                rule.child, rule.fk_column
            );
            let changed = tx.execute(
                &sql,
                params![deleted_at, now.timestamp_millis(), id.as_str()],
            )?;
            if changed > 0 {
                events.push((rule.child, ChangeKind::SoftDeleted));
            }
        }
    }

    let sql = format!(
        "UPDATE {table} SET is_deleted = 1, deleted_at = ?1, updated_at = ?1,
         last_modified = ?2, synced = 0
         WHERE id = ?3"
    );
    tx.execute(&sql, params![deleted_at, last_modified, id.as_str()])?;
    events.push((table, ChangeKind::SoftDeleted));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FeedLog, Flock, FlockPatch, HealthRecord, PlantingLog, SeedBatch, SeedBatchPatch,
        SyncFlag,
    };
    use pretty_assertions::assert_eq;

    fn setup() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_patch_applies_and_restamps() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();

        mark_for_sync(
            &store,
            &flock.id,
            Change::Update(Patch::Flock(FlockPatch {
                name: Some("Orchard layers".to_string()),
                species: None,
            })),
        )
        .unwrap();

        let updated: Flock = store.get(&flock.id).unwrap().unwrap();
        assert_eq!(updated.name, "Orchard layers");
        assert_eq!(updated.species, "chicken");
        assert_eq!(updated.meta.synced, SyncFlag::Dirty);
        assert_eq!(updated.meta.created_at, flock.meta.created_at);
        assert!(updated.meta.updated_at >= flock.meta.updated_at);
        assert!(updated.meta.last_modified > flock.meta.last_modified);
    }

    #[test]
    fn test_last_modified_strictly_increases() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();

        let mut previous = flock.meta.last_modified;
        for _ in 0..5 {
            mark_for_sync(
                &store,
                &flock.id,
                Change::Update(Patch::Flock(FlockPatch::default())),
            )
            .unwrap();
            let current: Flock = store.get(&flock.id).unwrap().unwrap();
            assert!(current.meta.last_modified > previous);
            previous = current.meta.last_modified;
        }
    }

    #[test]
    fn test_every_call_dirties_even_synced_records() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();
        store
            .mark_synced_batch(&[crate::db::SyncAck {
                table: Table::Flocks,
                id: flock.id,
                last_modified: flock.meta.last_modified,
            }])
            .unwrap();

        mark_for_sync(
            &store,
            &flock.id,
            Change::Update(Patch::Flock(FlockPatch::default())),
        )
        .unwrap();

        let flock: Flock = store.get(&flock.id).unwrap().unwrap();
        assert_eq!(flock.meta.synced, SyncFlag::Dirty);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = setup();
        let err = mark_for_sync(
            &store,
            &RecordId::new(),
            Change::Update(Patch::Flock(FlockPatch::default())),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { table: Table::Flocks, .. }));
    }

    #[test]
    fn test_delete_is_soft() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();

        mark_for_sync(&store, &flock.id, Change::Delete { table: Table::Flocks }).unwrap();

        // Invisible to normal reads, still physically present for sync
        let visible: Option<Flock> = store.get(&flock.id).unwrap();
        assert!(visible.is_none());
        let raw: Flock = store.get_any(&flock.id).unwrap().unwrap();
        assert!(raw.meta.is_deleted);
        assert!(raw.meta.deleted_at.is_some());
        assert_eq!(raw.meta.synced, SyncFlag::Dirty);
    }

    #[test]
    fn test_flock_delete_cascades_to_children() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();
        let health = HealthRecord::new(flock.id, "Vaccinated");
        let feed = FeedLog::new(flock.id, "layer pellets", 12.5);
        store.add(&health).unwrap();
        store.add(&feed).unwrap();

        mark_for_sync(&store, &flock.id, Change::Delete { table: Table::Flocks }).unwrap();

        let parent: Flock = store.get_any(&flock.id).unwrap().unwrap();
        let child_health: HealthRecord = store.get_any(&health.id).unwrap().unwrap();
        let child_feed: FeedLog = store.get_any(&feed.id).unwrap().unwrap();
        assert!(parent.meta.is_deleted);
        assert!(child_health.meta.is_deleted);
        assert!(child_feed.meta.is_deleted);
        // Parent and children are deleted at the same instant
        assert_eq!(parent.meta.deleted_at, child_health.meta.deleted_at);
        assert_eq!(parent.meta.deleted_at, child_feed.meta.deleted_at);
    }

    #[test]
    fn test_cascade_skips_other_parents_children() {
        let store = setup();
        let doomed = Flock::new("Doomed", "chicken");
        let spared = Flock::new("Spared", "duck");
        store.add(&doomed).unwrap();
        store.add(&spared).unwrap();
        let spared_feed = FeedLog::new(spared.id, "grower mash", 3.0);
        store.add(&spared_feed).unwrap();

        mark_for_sync(&store, &doomed.id, Change::Delete { table: Table::Flocks }).unwrap();

        let untouched: FeedLog = store.get(&spared_feed.id).unwrap().unwrap();
        assert!(!untouched.meta.is_deleted);
    }

    #[test]
    fn test_blocked_delete_returns_conflict_and_writes_nothing() {
        let store = setup();
        let batch = SeedBatch::new("maize", 25.0);
        store.add(&batch).unwrap();
        let planting = PlantingLog::new(batch.id, "north field", 5.0);
        store.add(&planting).unwrap();

        let err = mark_for_sync(
            &store,
            &batch.id,
            Change::Delete {
                table: Table::SeedBatches,
            },
        )
        .unwrap_err();

        match err {
            Error::Conflict {
                table,
                dependent_table,
                dependents,
            } => {
                assert_eq!(table, Table::SeedBatches);
                assert_eq!(dependent_table, Table::PlantingLogs);
                assert_eq!(dependents, 1);
            }
            other => panic!("expected conflict, got {other}"),
        }

        // Parent and dependent are completely unchanged
        let parent: SeedBatch = store.get(&batch.id).unwrap().unwrap();
        assert_eq!(parent, batch);
        let child: PlantingLog = store.get(&planting.id).unwrap().unwrap();
        assert_eq!(child, planting);
    }

    #[test]
    fn test_delete_allowed_once_dependents_resolved() {
        let store = setup();
        let batch = SeedBatch::new("maize", 25.0);
        store.add(&batch).unwrap();
        let planting = PlantingLog::new(batch.id, "north field", 5.0);
        store.add(&planting).unwrap();

        mark_for_sync(
            &store,
            &planting.id,
            Change::Delete {
                table: Table::PlantingLogs,
            },
        )
        .unwrap();
        mark_for_sync(
            &store,
            &batch.id,
            Change::Delete {
                table: Table::SeedBatches,
            },
        )
        .unwrap();

        let gone: Option<SeedBatch> = store.get(&batch.id).unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn test_quantity_patch_updates_inventory() {
        let store = setup();
        let batch = SeedBatch::new("maize", 25.0);
        store.add(&batch).unwrap();

        mark_for_sync(
            &store,
            &batch.id,
            Change::Update(Patch::SeedBatch(SeedBatchPatch {
                crop: None,
                quantity_kg: Some(20.0),
            })),
        )
        .unwrap();

        let updated: SeedBatch = store.get(&batch.id).unwrap().unwrap();
        assert!((updated.quantity_kg - 20.0).abs() < f64::EPSILON);
    }
}
