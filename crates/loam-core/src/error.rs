//! Error types for loam-core

use thiserror::Error;

use crate::models::Table;

/// Result type alias using loam-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in loam-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Mutation target does not exist in the given table
    #[error("Record not found: {table}/{id}")]
    NotFound { table: Table, id: String },

    /// Deletion refused because live dependent records still reference the target
    #[error("Cannot delete from {table}: {dependents} dependent record(s) in {dependent_table}")]
    Conflict {
        table: Table,
        dependent_table: Table,
        dependents: usize,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
