use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loam")]
#[command(about = "Offline-first farm records from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage flocks and their records
    Flock {
        #[command(subcommand)]
        command: FlockCommands,
    },
    /// Manage seed batches and plantings
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },
    /// Show unsynced record counts per table
    Status,
    /// Push local changes to the remote server
    Sync {
        /// Push endpoint (defaults to LOAM_SYNC_URL)
        #[arg(long)]
        url: Option<String>,
        /// Bearer token (defaults to LOAM_SYNC_TOKEN)
        #[arg(long)]
        token: Option<String>,
        /// Keep pushing on this interval, in seconds
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum FlockCommands {
    /// Register a new flock
    Add {
        /// Flock name
        name: String,
        /// Species or breed
        #[arg(long, default_value = "chicken")]
        species: String,
    },
    /// List flocks, most recently modified first
    List {
        /// Number of flocks to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a flock (soft-deletes its health records and feed logs)
    Delete {
        /// Flock ID
        id: String,
    },
    /// Record feed given to a flock
    Feed {
        /// Flock ID
        id: String,
        /// Feed kind, e.g. "layer pellets"
        #[arg(long)]
        feed_type: String,
        /// Quantity fed, in kilograms
        #[arg(long)]
        quantity_kg: f64,
    },
    /// Record a health or treatment entry for a flock
    Health {
        /// Flock ID
        id: String,
        /// What was observed or administered
        description: String,
    },
}

#[derive(Subcommand)]
pub enum SeedCommands {
    /// Register a new seed batch
    Add {
        /// Crop name
        crop: String,
        /// Batch quantity, in kilograms
        #[arg(long)]
        quantity_kg: f64,
    },
    /// List seed batches, most recently modified first
    List {
        /// Number of batches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a seed batch (refused while plantings reference it)
    Delete {
        /// Seed batch ID
        id: String,
    },
    /// Record a planting and deduct the seed used
    Plant {
        /// Seed batch ID
        id: String,
        /// Field or bed identifier
        #[arg(long)]
        field: String,
        /// Seed consumed, in kilograms
        #[arg(long)]
        quantity_kg: f64,
    },
}
