//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: poultry tables
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS flocks (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            species TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            synced INTEGER,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_flocks_last_modified ON flocks(last_modified DESC);
        CREATE INDEX IF NOT EXISTS idx_flocks_synced ON flocks(synced);
        CREATE INDEX IF NOT EXISTS idx_flocks_deleted ON flocks(is_deleted);
        CREATE TABLE IF NOT EXISTS health_records (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            synced INTEGER,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_health_records_flock ON health_records(flock_id);
        CREATE INDEX IF NOT EXISTS idx_health_records_synced ON health_records(synced);
        CREATE INDEX IF NOT EXISTS idx_health_records_deleted ON health_records(is_deleted);
        CREATE TABLE IF NOT EXISTS feed_logs (
            id TEXT PRIMARY KEY,
            flock_id TEXT NOT NULL,
            feed_type TEXT NOT NULL,
            quantity_kg REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            synced INTEGER,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_feed_logs_flock ON feed_logs(flock_id);
        CREATE INDEX IF NOT EXISTS idx_feed_logs_synced ON feed_logs(synced);
        CREATE INDEX IF NOT EXISTS idx_feed_logs_deleted ON feed_logs(is_deleted);
        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: crop input tables
fn migrate_v2(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS seed_batches (
            id TEXT PRIMARY KEY,
            crop TEXT NOT NULL,
            quantity_kg REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            synced INTEGER,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_seed_batches_last_modified ON seed_batches(last_modified DESC);
        CREATE INDEX IF NOT EXISTS idx_seed_batches_synced ON seed_batches(synced);
        CREATE INDEX IF NOT EXISTS idx_seed_batches_deleted ON seed_batches(is_deleted);
        CREATE TABLE IF NOT EXISTS planting_logs (
            id TEXT PRIMARY KEY,
            seed_batch_id TEXT NOT NULL,
            field TEXT NOT NULL,
            quantity_kg REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            synced INTEGER,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_planting_logs_batch ON planting_logs(seed_batch_id);
        CREATE INDEX IF NOT EXISTS idx_planting_logs_synced ON planting_logs(synced);
        CREATE INDEX IF NOT EXISTS idx_planting_logs_deleted ON planting_logs(is_deleted);
        INSERT INTO schema_version (version) VALUES (2);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let mut conn = setup();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_all_entity_tables_exist() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        for table in crate::models::Table::ALL {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(
                        SELECT 1 FROM sqlite_master
                        WHERE type = 'table' AND name = ?
                    )",
                    [table.name()],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }
}
