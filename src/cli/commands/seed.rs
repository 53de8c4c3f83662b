//! Seed command implementation.

use crate::cli::{OutputMode, SeedArgs};
use crate::config::{Settings, open_storage};
use crate::error::Result;
use crate::seed;
use chrono::Utc;

/// Load the sample dataset into the configured database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, already holds data
/// (without `--force`), or an insert fails.
pub fn execute(args: &SeedArgs, mode: OutputMode, settings: &Settings) -> Result<()> {
    let mut storage = open_storage(settings)?;
    let summary = seed::seed(&mut storage, Utc::now(), args.force)?;

    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputMode::Text => println!(
            "Seeded {} projects with {} issues into {}",
            summary.projects,
            summary.issues,
            settings.db_path.display()
        ),
        OutputMode::Quiet => {}
    }
    Ok(())
}
