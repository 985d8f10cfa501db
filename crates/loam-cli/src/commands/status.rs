use loam_core::db::Store;

use crate::error::CliError;

pub fn run_status(store: &Store) -> Result<(), CliError> {
    let counts = store.dirty_counts()?;
    let total: usize = counts.iter().map(|(_, count)| count).sum();

    if total == 0 {
        println!("All records synced.");
        return Ok(());
    }

    println!("{total} record(s) awaiting sync:");
    for (table, count) in counts {
        if count > 0 {
            println!("  {table}: {count}");
        }
    }
    Ok(())
}
