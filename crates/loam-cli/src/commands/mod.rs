//! Command implementations

pub mod flock;
pub mod seed;
pub mod status;
pub mod sync;

use std::fs;
use std::path::{Path, PathBuf};

use loam_core::db::Store;
use loam_core::RecordId;

use crate::error::CliError;

/// Open the store at the given path, or at the default data location
pub fn open_store(db_path: Option<&Path>) -> Result<Store, CliError> {
    let path = match db_path {
        Some(path) => path.to_path_buf(),
        None => default_db_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    tracing::debug!("opening store at {}", path.display());
    Ok(Store::open(path)?)
}

fn default_db_path() -> Result<PathBuf, CliError> {
    let base = dirs::data_dir().ok_or(CliError::NoDataDir)?;
    Ok(base.join("loam").join("loam.db"))
}

/// Parse a record id argument
pub fn parse_id(raw: &str) -> Result<RecordId, CliError> {
    raw.parse()
        .map_err(|_| CliError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = RecordId::new();
        assert_eq!(parse_id(&id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_open_store_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("records.db");
        let store = open_store(Some(&path)).unwrap();
        drop(store);
        assert!(path.exists());
    }
}
