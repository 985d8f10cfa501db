//! The local store: a mutex-guarded `SQLite` connection with typed
//! table access and change notifications.
//!
//! All durability is local-device only until the sync engine runs. Default
//! reads exclude soft-deleted rows; the sync paths use the `_any`/dirty
//! variants that see them.

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection};
use tokio::sync::broadcast;

use super::migrations;
use super::record::Entity;
use crate::error::Result;
use crate::models::{RecordId, Table};

/// Capacity of the change-notification channel; live queries that fall
/// behind re-evaluate from scratch, so lagging is harmless.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What happened to a table, published after every committed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
}

/// Kind of committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    SoftDeleted,
    /// Sync flags cleared after a server acknowledgment
    Acknowledged,
}

/// A per-record server acknowledgment to apply locally.
///
/// `last_modified` is the value captured when the record was pushed; the
/// flag is only cleared if the row still matches, so an edit made while the
/// push was in flight keeps the record dirty.
#[derive(Debug, Clone, Copy)]
pub struct SyncAck {
    pub table: Table,
    pub id: RecordId,
    pub last_modified: i64,
}

/// Process-wide local store, shared as `Arc<Store>`.
///
/// The mutex enforces the single-writer model: multi-step mutations run
/// inside one SQL transaction while holding the guard, so readers never see
/// a half-applied cascade.
pub struct Store {
    conn: Mutex<Connection>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Store {
    /// Open (and migrate) a database file, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        migrations::run(&mut conn)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            events,
        })
    }

    /// Insert a freshly created record.
    ///
    /// New records carry dirty metadata from construction, so no extra
    /// stamping happens here.
    pub fn add<E: Entity>(&self, entity: &E) -> Result<()> {
        {
            let conn = self.lock();
            entity.insert(&conn)?;
        }
        self.publish(E::TABLE, ChangeKind::Created);
        Ok(())
    }

    /// Fetch a record by id, excluding soft-deleted rows
    pub fn get<E: Entity>(&self, id: &RecordId) -> Result<Option<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND is_deleted = 0",
            E::COLUMNS,
            E::TABLE
        );
        self.query_one(&sql, id)
    }

    /// Fetch a record by id, including soft-deleted rows
    pub fn get_any<E: Entity>(&self, id: &RecordId) -> Result<Option<E>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", E::COLUMNS, E::TABLE);
        self.query_one(&sql, id)
    }

    fn query_one<E: Entity>(&self, sql: &str, id: &RecordId) -> Result<Option<E>> {
        let conn = self.lock();
        match conn.query_row(sql, params![id.as_str()], E::from_row) {
            Ok(entity) => Ok(Some(entity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List live records, most recently modified first
    pub fn list<E: Entity>(&self, limit: usize, offset: usize) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT {} FROM {}
             WHERE is_deleted = 0
             ORDER BY last_modified DESC
             LIMIT ? OFFSET ?",
            E::COLUMNS,
            E::TABLE
        );
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], E::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// List live records whose `fk_column` references `parent`
    pub fn list_where<E: Entity>(&self, fk_column: &'static str, parent: &RecordId) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT {} FROM {}
             WHERE {fk_column} = ? AND is_deleted = 0
             ORDER BY last_modified DESC",
            E::COLUMNS,
            E::TABLE
        );
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![parent.as_str()], E::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Count live rows in `table` whose `fk_column` references `parent`
    pub fn count_where(
        &self,
        table: Table,
        fk_column: &'static str,
        parent: &RecordId,
    ) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {fk_column} = ? AND is_deleted = 0");
        let conn = self.lock();
        let count: i64 = conn.query_row(&sql, params![parent.as_str()], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// All records not yet confirmed by the remote system, soft-deleted
    /// included. Rows with an unknown flag count as dirty.
    pub(crate) fn dirty<E: Entity>(&self) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE synced IS NOT 1 ORDER BY last_modified ASC",
            E::COLUMNS,
            E::TABLE
        );
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], E::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Unconfirmed-record count per table, for status displays
    pub fn dirty_counts(&self) -> Result<Vec<(Table, usize)>> {
        let conn = self.lock();
        let mut counts = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE synced IS NOT 1");
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            counts.push((table, usize::try_from(count).unwrap_or(0)));
        }
        Ok(counts)
    }

    /// Apply server acknowledgments in one transaction.
    ///
    /// Sets `synced = 1` without touching `updated_at` or `last_modified`
    /// (an acknowledgment must not look like a new local edit). Returns how
    /// many rows were actually cleared; stale acknowledgments are skipped.
    pub fn mark_synced_batch(&self, acks: &[SyncAck]) -> Result<usize> {
        if acks.is_empty() {
            return Ok(0);
        }

        let mut cleared = 0usize;
        let mut touched: Vec<Table> = Vec::new();
        {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            for ack in acks {
                let sql = format!(
                    "UPDATE {} SET synced = 1
                     WHERE id = ? AND last_modified = ? AND synced IS NOT 1",
                    ack.table
                );
                let n = tx.execute(&sql, params![ack.id.as_str(), ack.last_modified])?;
                if n > 0 {
                    cleared += n;
                    if !touched.contains(&ack.table) {
                        touched.push(ack.table);
                    }
                }
            }
            tx.commit()?;
        }

        for table in touched {
            self.publish(table, ChangeKind::Acknowledged);
        }
        Ok(cleared)
    }

    /// Subscribe to committed-change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, table: Table, kind: ChangeKind) {
        // No receivers is fine; nothing is watching yet.
        let _ = self.events.send(ChangeEvent { table, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedLog, Flock, SeedBatch, SyncFlag};
    use pretty_assertions::assert_eq;

    fn setup() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let store = setup();
        let flock = Flock::new("Barn layers", "chicken");
        store.add(&flock).unwrap();

        let fetched: Flock = store.get(&flock.id).unwrap().unwrap();
        assert_eq!(fetched, flock);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = setup();
        let missing: Option<Flock> = store.get(&RecordId::new()).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let store = setup();
        let mut older = Flock::new("Old", "chicken");
        older.meta.last_modified -= 10;
        store.add(&older).unwrap();
        let newer = Flock::new("New", "duck");
        store.add(&newer).unwrap();

        let flocks: Vec<Flock> = store.list(10, 0).unwrap();
        assert_eq!(flocks.len(), 2);
        assert_eq!(flocks[0].id, newer.id);
    }

    #[test]
    fn test_list_where_filters_by_parent() {
        let store = setup();
        let flock_a = Flock::new("A", "chicken");
        let flock_b = Flock::new("B", "duck");
        store.add(&flock_a).unwrap();
        store.add(&flock_b).unwrap();
        store
            .add(&FeedLog::new(flock_a.id, "layer pellets", 10.0))
            .unwrap();
        store.add(&FeedLog::new(flock_b.id, "grower mash", 5.0)).unwrap();

        let logs: Vec<FeedLog> = store.list_where("flock_id", &flock_a.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].flock_id, flock_a.id);
    }

    #[test]
    fn test_new_records_are_dirty() {
        let store = setup();
        store.add(&SeedBatch::new("maize", 25.0)).unwrap();

        let dirty: Vec<SeedBatch> = store.dirty().unwrap();
        assert_eq!(dirty.len(), 1);

        let counts = store.dirty_counts().unwrap();
        let batches = counts
            .iter()
            .find(|(table, _)| *table == Table::SeedBatches)
            .unwrap();
        assert_eq!(batches.1, 1);
    }

    #[test]
    fn test_mark_synced_preserves_timestamps() {
        let store = setup();
        let batch = SeedBatch::new("maize", 25.0);
        store.add(&batch).unwrap();

        let cleared = store
            .mark_synced_batch(&[SyncAck {
                table: Table::SeedBatches,
                id: batch.id,
                last_modified: batch.meta.last_modified,
            }])
            .unwrap();
        assert_eq!(cleared, 1);

        let synced: SeedBatch = store.get(&batch.id).unwrap().unwrap();
        assert_eq!(synced.meta.synced, SyncFlag::Synced);
        assert_eq!(synced.meta.updated_at, batch.meta.updated_at);
        assert_eq!(synced.meta.last_modified, batch.meta.last_modified);
    }

    #[test]
    fn test_stale_ack_is_skipped() {
        let store = setup();
        let batch = SeedBatch::new("maize", 25.0);
        store.add(&batch).unwrap();

        // Acknowledge a version older than what is stored
        let cleared = store
            .mark_synced_batch(&[SyncAck {
                table: Table::SeedBatches,
                id: batch.id,
                last_modified: batch.meta.last_modified - 1,
            }])
            .unwrap();
        assert_eq!(cleared, 0);

        let still_dirty: SeedBatch = store.get(&batch.id).unwrap().unwrap();
        assert_eq!(still_dirty.meta.synced, SyncFlag::Dirty);
    }

    #[test]
    fn test_open_persists_to_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("loam.db");
        {
            let store = Store::open(&path).unwrap();
            store.add(&Flock::new("Barn layers", "chicken")).unwrap();
        }

        let reopened = Store::open(&path).unwrap();
        let flocks: Vec<Flock> = reopened.list(10, 0).unwrap();
        assert_eq!(flocks.len(), 1);
    }

    #[test]
    fn test_events_published_on_add() {
        let store = setup();
        let mut events = store.subscribe();
        store.add(&Flock::new("Barn layers", "chicken")).unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.table, Table::Flocks);
        assert_eq!(event.kind, ChangeKind::Created);
    }
}
