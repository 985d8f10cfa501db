//! Row mapping between entities and their SQL tables

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::models::{
    FeedLog, Flock, HealthRecord, PlantingLog, RecordId, SeedBatch, SyncMeta, Table,
};

/// Storage contract implemented by every syncable entity.
///
/// `COLUMNS` is the full select list, domain columns first, followed by the
/// six metadata columns in the fixed order `created_at`, `updated_at`,
/// `last_modified`, `synced`, `is_deleted`, `deleted_at`.
pub trait Entity: Serialize + Sized {
    const TABLE: Table;
    const COLUMNS: &'static str;

    fn id(&self) -> RecordId;
    fn meta(&self) -> &SyncMeta;
    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Parse an id column, mapping parse failures to a rusqlite error
fn parse_id(idx: usize, raw: &str) -> rusqlite::Result<RecordId> {
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Entity for Flock {
    const TABLE: Table = Table::Flocks;
    const COLUMNS: &'static str =
        "id, name, species, created_at, updated_at, last_modified, synced, is_deleted, deleted_at";

    fn id(&self) -> RecordId {
        self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let m = &self.meta;
        conn.execute(
            "INSERT INTO flocks (id, name, species, created_at, updated_at, last_modified, synced, is_deleted, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id.as_str(),
                self.name,
                self.species,
                m.created_at.to_rfc3339(),
                m.updated_at.to_rfc3339(),
                m.last_modified,
                m.synced.as_sql(),
                i64::from(m.is_deleted),
                m.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(0, &row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            species: row.get(2)?,
            meta: SyncMeta::from_row(row, 3)?,
        })
    }
}

impl Entity for HealthRecord {
    const TABLE: Table = Table::HealthRecords;
    const COLUMNS: &'static str =
        "id, flock_id, description, created_at, updated_at, last_modified, synced, is_deleted, deleted_at";

    fn id(&self) -> RecordId {
        self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let m = &self.meta;
        conn.execute(
            "INSERT INTO health_records (id, flock_id, description, created_at, updated_at, last_modified, synced, is_deleted, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id.as_str(),
                self.flock_id.as_str(),
                self.description,
                m.created_at.to_rfc3339(),
                m.updated_at.to_rfc3339(),
                m.last_modified,
                m.synced.as_sql(),
                i64::from(m.is_deleted),
                m.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(0, &row.get::<_, String>(0)?)?,
            flock_id: parse_id(1, &row.get::<_, String>(1)?)?,
            description: row.get(2)?,
            meta: SyncMeta::from_row(row, 3)?,
        })
    }
}

impl Entity for FeedLog {
    const TABLE: Table = Table::FeedLogs;
    const COLUMNS: &'static str =
        "id, flock_id, feed_type, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at";

    fn id(&self) -> RecordId {
        self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let m = &self.meta;
        conn.execute(
            "INSERT INTO feed_logs (id, flock_id, feed_type, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id.as_str(),
                self.flock_id.as_str(),
                self.feed_type,
                self.quantity_kg,
                m.created_at.to_rfc3339(),
                m.updated_at.to_rfc3339(),
                m.last_modified,
                m.synced.as_sql(),
                i64::from(m.is_deleted),
                m.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(0, &row.get::<_, String>(0)?)?,
            flock_id: parse_id(1, &row.get::<_, String>(1)?)?,
            feed_type: row.get(2)?,
            quantity_kg: row.get(3)?,
            meta: SyncMeta::from_row(row, 4)?,
        })
    }
}

impl Entity for SeedBatch {
    const TABLE: Table = Table::SeedBatches;
    const COLUMNS: &'static str =
        "id, crop, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at";

    fn id(&self) -> RecordId {
        self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let m = &self.meta;
        conn.execute(
            "INSERT INTO seed_batches (id, crop, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id.as_str(),
                self.crop,
                self.quantity_kg,
                m.created_at.to_rfc3339(),
                m.updated_at.to_rfc3339(),
                m.last_modified,
                m.synced.as_sql(),
                i64::from(m.is_deleted),
                m.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(0, &row.get::<_, String>(0)?)?,
            crop: row.get(1)?,
            quantity_kg: row.get(2)?,
            meta: SyncMeta::from_row(row, 3)?,
        })
    }
}

impl Entity for PlantingLog {
    const TABLE: Table = Table::PlantingLogs;
    const COLUMNS: &'static str =
        "id, seed_batch_id, field, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at";

    fn id(&self) -> RecordId {
        self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let m = &self.meta;
        conn.execute(
            "INSERT INTO planting_logs (id, seed_batch_id, field, quantity_kg, created_at, updated_at, last_modified, synced, is_deleted, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id.as_str(),
                self.seed_batch_id.as_str(),
                self.field,
                self.quantity_kg,
                m.created_at.to_rfc3339(),
                m.updated_at.to_rfc3339(),
                m.last_modified,
                m.synced.as_sql(),
                i64::from(m.is_deleted),
                m.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(0, &row.get::<_, String>(0)?)?,
            seed_batch_id: parse_id(1, &row.get::<_, String>(1)?)?,
            field: row.get(2)?,
            quantity_kg: row.get(3)?,
            meta: SyncMeta::from_row(row, 4)?,
        })
    }
}
