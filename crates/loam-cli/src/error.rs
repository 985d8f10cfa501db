use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] loam_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] loam_core::sync::TransportError),
    #[error("Record ID is not valid: {0}")]
    InvalidId(String),
    #[error("Insufficient seed: {available} kg in batch, {requested} kg requested")]
    InsufficientSeed { available: f64, requested: f64 },
    #[error("Could not determine a data directory; pass --db-path")]
    NoDataDir,
    #[error("Sync is not configured. Set LOAM_SYNC_URL (and LOAM_SYNC_TOKEN if required), or pass --url.")]
    SyncNotConfigured,
    #[error("Sync incomplete: {0} error(s); dirty records will be retried")]
    SyncIncomplete(usize),
}
