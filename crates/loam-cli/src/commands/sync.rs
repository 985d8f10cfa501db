use std::sync::Arc;
use std::time::Duration;

use loam_core::db::Store;
use loam_core::sync::{HttpSyncTransport, SyncEngine};
use loam_core::SyncConfig;

use crate::error::CliError;

pub async fn run_sync(
    store: &Arc<Store>,
    url: Option<String>,
    token: Option<String>,
    interval: Option<u64>,
) -> Result<(), CliError> {
    let mut config = SyncConfig::from_env();
    if let Some(url) = url {
        config.endpoint = Some(url);
    }
    if let Some(token) = token {
        config.auth_token = Some(token);
    }
    if !config.is_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    let transport = HttpSyncTransport::new(&config)?;
    let engine = SyncEngine::new(Arc::clone(store), transport);

    if let Some(secs) = interval {
        println!("Pushing every {secs}s; Ctrl-C to stop.");
        engine.run_on_interval(Duration::from_secs(secs)).await;
        return Ok(());
    }

    let outcome = engine.request_push_changes().await;
    if outcome.success {
        println!("Sync completed");
        return Ok(());
    }

    for error in &outcome.errors {
        eprintln!("sync: {error}");
    }
    Err(CliError::SyncIncomplete(outcome.errors.len()))
}
