//! Syncable record identity and bookkeeping fields

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for any syncable record, using UUID v7 (time-sortable).
///
/// Ids are assigned on the device at creation time and never by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Tri-state sync flag stored alongside every record.
///
/// `Unknown` covers rows whose flag was never written (SQL NULL); they are
/// treated as dirty so nothing is skipped by the push scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncFlag {
    /// Local state has not been confirmed by the remote system
    #[default]
    Dirty,
    /// The remote system acknowledged this exact record state
    Synced,
    /// Flag was never stamped (legacy or imported row)
    Unknown,
}

impl SyncFlag {
    /// SQL representation: `0` dirty, `1` synced, NULL unknown
    #[must_use]
    pub const fn as_sql(self) -> Option<i64> {
        match self {
            Self::Dirty => Some(0),
            Self::Synced => Some(1),
            Self::Unknown => None,
        }
    }

    /// Decode the SQL representation
    #[must_use]
    pub const fn from_sql(value: Option<i64>) -> Self {
        match value {
            Some(1) => Self::Synced,
            Some(_) => Self::Dirty,
            None => Self::Unknown,
        }
    }

    /// True only for records the remote system has confirmed
    #[must_use]
    pub const fn is_synced(self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// Bookkeeping fields shared by every syncable record.
///
/// Serialized flattened into each record's push payload; the local sync flag
/// stays device-private and is never transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncMeta {
    /// Creation timestamp, set once and never mutated
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp (including soft delete)
    pub updated_at: DateTime<Utc>,
    /// Monotonic local clock (epoch ms); recency marker and sync tie-breaker
    #[serde(rename = "_last_modified")]
    pub last_modified: i64,
    /// Local-only dirty flag
    #[serde(skip)]
    pub synced: SyncFlag,
    /// Soft delete flag; deleted rows stay present for sync reconciliation
    pub is_deleted: bool,
    /// Set atomically with `is_deleted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SyncMeta {
    /// Fresh metadata for a newly created (and therefore dirty) record
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            last_modified: now.timestamp_millis(),
            synced: SyncFlag::Dirty,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Read the six metadata columns starting at `base` in a row.
    ///
    /// Column order is fixed across all tables: `created_at`, `updated_at`,
    /// `last_modified`, `synced`, `is_deleted`, `deleted_at`.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<Self> {
        let deleted_at = row
            .get::<_, Option<String>>(base + 5)?
            .map(|s| parse_timestamp(base + 5, &s))
            .transpose()?;
        Ok(Self {
            created_at: parse_timestamp(base, &row.get::<_, String>(base)?)?,
            updated_at: parse_timestamp(base + 1, &row.get::<_, String>(base + 1)?)?,
            last_modified: row.get(base + 2)?,
            synced: SyncFlag::from_sql(row.get(base + 3)?),
            is_deleted: row.get::<_, i64>(base + 4)? != 0,
            deleted_at,
        })
    }
}

impl Default for SyncMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an RFC 3339 timestamp column
fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
