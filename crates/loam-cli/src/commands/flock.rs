use loam_core::db::Store;
use loam_core::models::{FeedLog, Flock, HealthRecord, Table};
use loam_core::{mark_for_sync, Change};
use serde::Serialize;

use super::parse_id;
use crate::error::CliError;

#[derive(Serialize)]
struct FlockItem {
    id: String,
    name: String,
    species: String,
    updated_at: String,
}

pub fn run_add(store: &Store, name: &str, species: &str) -> Result<(), CliError> {
    let flock = Flock::new(name, species);
    store.add(&flock)?;
    println!("{}", flock.id);
    Ok(())
}

pub fn run_list(store: &Store, limit: usize, as_json: bool) -> Result<(), CliError> {
    let flocks: Vec<Flock> = store.list(limit, 0)?;

    if as_json {
        let items: Vec<FlockItem> = flocks
            .iter()
            .map(|flock| FlockItem {
                id: flock.id.as_str(),
                name: flock.name.clone(),
                species: flock.species.clone(),
                updated_at: flock.meta.updated_at.to_rfc3339(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if flocks.is_empty() {
        println!("No flocks recorded.");
        return Ok(());
    }
    for flock in flocks {
        println!("{}  {} ({})", flock.id, flock.name, flock.species);
    }
    Ok(())
}

pub fn run_delete(store: &Store, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    mark_for_sync(store, &id, Change::Delete { table: Table::Flocks })?;
    println!("Deleted flock {id} (health records and feed logs included)");
    Ok(())
}

pub fn run_feed(store: &Store, id: &str, feed_type: &str, quantity_kg: f64) -> Result<(), CliError> {
    let flock_id = parse_id(id)?;
    let flock: Flock = store
        .get(&flock_id)?
        .ok_or_else(|| loam_core::Error::NotFound {
            table: Table::Flocks,
            id: flock_id.to_string(),
        })?;

    let log = FeedLog::new(flock.id, feed_type, quantity_kg);
    store.add(&log)?;
    println!("{}", log.id);
    Ok(())
}

pub fn run_health(store: &Store, id: &str, description: &str) -> Result<(), CliError> {
    let flock_id = parse_id(id)?;
    let flock: Flock = store
        .get(&flock_id)?
        .ok_or_else(|| loam_core::Error::NotFound {
            table: Table::Flocks,
            id: flock_id.to_string(),
        })?;

    let record = HealthRecord::new(flock.id, description);
    store.add(&record)?;
    println!("{}", record.id);
    Ok(())
}
