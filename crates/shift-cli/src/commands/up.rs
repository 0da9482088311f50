//! Up command - apply every pending migration.

use anyhow::Result;
use serde::Serialize;
use shift_migrations::{Engine, Migration};

use crate::output::{self, CommandResult, OutputFormat};

/// Versions applied by one run.
#[derive(Debug, Serialize)]
pub struct UpOutput {
    pub applied: Vec<i64>,
}

/// Execute the up command.
///
/// Migrations are applied one by one in ascending order; the first failure
/// aborts the run and earlier migrations stay applied.
pub async fn execute(engine: &Engine, format: OutputFormat) -> Result<()> {
    let pending: Vec<Migration> = engine
        .unapplied()
        .await?
        .into_iter()
        .filter(Migration::persistable)
        .collect();

    let mut applied = Vec::with_capacity(pending.len());
    for migration in &pending {
        if format == OutputFormat::Text {
            output::progress(&format!("Applying migration: {}...", migration.version()));
        }

        engine.apply(migration).await?;
        applied.push(migration.version());
    }

    let message = if applied.is_empty() {
        "No migrations to apply".to_string()
    } else {
        format!("Applied {} migration(s)", applied.len())
    };

    CommandResult::success_with_message(UpOutput { applied }, message).print(format)
}
