//! Loam CLI - offline-first farm records from the command line
//!
//! Every mutation lands in the local store immediately; `loam sync` pushes
//! whatever is dirty when connectivity allows.

mod cli;
mod commands;
mod error;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, FlockCommands, SeedCommands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let store = Arc::new(commands::open_store(cli.db_path.as_deref())?);

    match cli.command {
        Commands::Flock { command } => match command {
            FlockCommands::Add { name, species } => commands::flock::run_add(&store, &name, &species),
            FlockCommands::List { limit, json } => commands::flock::run_list(&store, limit, json),
            FlockCommands::Delete { id } => commands::flock::run_delete(&store, &id),
            FlockCommands::Feed {
                id,
                feed_type,
                quantity_kg,
            } => commands::flock::run_feed(&store, &id, &feed_type, quantity_kg),
            FlockCommands::Health { id, description } => {
                commands::flock::run_health(&store, &id, &description)
            }
        },
        Commands::Seed { command } => match command {
            SeedCommands::Add { crop, quantity_kg } => {
                commands::seed::run_add(&store, &crop, quantity_kg)
            }
            SeedCommands::List { limit, json } => commands::seed::run_list(&store, limit, json),
            SeedCommands::Delete { id } => commands::seed::run_delete(&store, &id),
            SeedCommands::Plant {
                id,
                field,
                quantity_kg,
            } => commands::seed::run_plant(&store, &id, &field, quantity_kg),
        },
        Commands::Status => commands::status::run_status(&store),
        Commands::Sync {
            url,
            token,
            interval,
        } => commands::sync::run_sync(&store, url, token, interval).await,
    }
}
