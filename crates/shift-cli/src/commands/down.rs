//! Down command - revert the current migration.

use anyhow::Result;
use serde::Serialize;
use shift_migrations::Engine;

use super::status::warn_missing;
use crate::output::{self, CommandResult, OutputFormat};

/// Version reverted by one run, if any.
#[derive(Debug, Serialize)]
pub struct DownOutput {
    pub reverted: Option<i64>,
    /// Recorded versions the source lacks; set when they block the revert.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<i64>,
}

/// Execute the down command.
pub async fn execute(engine: &Engine, format: OutputFormat) -> Result<()> {
    let Some(current) = engine.current().await? else {
        // The highest recorded version may be one the source no longer has.
        let missing = engine.status().await?.missing;
        if format == OutputFormat::Text && !missing.is_empty() {
            warn_missing(&missing);
        }

        return CommandResult::success_with_message(
            DownOutput {
                reverted: None,
                missing,
            },
            "No migrations to revert",
        )
        .print(format);
    };

    if format == OutputFormat::Text {
        output::progress(&format!("Reverting migration: {}...", current.version()));
    }

    engine.revert(&current).await?;

    CommandResult::success_with_message(
        DownOutput {
            reverted: Some(current.version()),
            missing: Vec::new(),
        },
        format!("Reverted {current}"),
    )
    .print(format)
}
