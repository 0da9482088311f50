//! Status command - compare the migration source with the database.

use anyhow::Result;
use shift_migrations::Engine;

use crate::output::{self, CommandResult, OutputFormat};

/// Execute the status command.
pub async fn execute(engine: &Engine, format: OutputFormat) -> Result<()> {
    let status = engine.status().await?;

    if format == OutputFormat::Json {
        return CommandResult::success(status).print(format);
    }

    let known = engine.known()?;

    output::section("Migration Status");
    output::key_value(
        "Current",
        &status
            .current
            .map_or_else(|| "none".to_string(), |v| v.to_string()),
    );
    output::key_value("Applied", &status.applied.len().to_string());
    output::key_value("Pending", &status.pending.len().to_string());

    if !status.pending.is_empty() {
        output::section("Pending Migrations");
        for version in &status.pending {
            match known.find(*version) {
                Some(migration) => println!("  ○ {migration}"),
                None => println!("  ○ {version}"),
            }
        }
    }

    if status.has_drift() {
        println!();
        warn_missing(&status.missing);
    }

    if status.is_up_to_date() {
        println!();
        output::success("Database is up to date");
    }

    Ok(())
}

/// Warn about recorded versions the source no longer has.
pub fn warn_missing(missing: &[i64]) {
    output::warning(&format!(
        "{} applied migration(s) missing from the source:",
        missing.len()
    ));
    for version in missing {
        println!("  ? {version}");
    }
}
