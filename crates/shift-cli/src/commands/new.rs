//! New command - scaffold a migration directory.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use shift_migrations::migration::{DOWN_FILE, UP_FILE};
use shift_migrations::{Clock, Migration, SystemClock};
use std::path::{Path, PathBuf};

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the new command.
#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// What the migration does, e.g. "create users"
    pub description: String,
}

/// Created migration.
#[derive(Debug, Serialize)]
pub struct NewOutput {
    pub version: i64,
    pub path: PathBuf,
}

/// Execute the new command.
pub fn execute(args: &NewArgs, src: &Path, format: OutputFormat) -> Result<()> {
    let (migration, dir) = scaffold(&args.description, src, &SystemClock)?;

    match format {
        OutputFormat::Json => CommandResult::success(NewOutput {
            version: migration.version(),
            path: dir,
        })
        .print(format),
        OutputFormat::Text => {
            output::success(&format!("Created {}", dir.display()));
            output::key_value("Version", &migration.version().to_string());
            Ok(())
        }
    }
}

/// Create `{src}/{version}_{name}/` with an `up.sql` and an empty `down.sql`.
pub fn scaffold(description: &str, src: &Path, clock: &dyn Clock) -> Result<(Migration, PathBuf)> {
    if description.trim().is_empty() {
        bail!("Migration description must not be empty");
    }

    let migration = Migration::generate(description, clock)?;
    let dir = src.join(migration.path());
    if dir.exists() {
        bail!("Migration {} already exists", dir.display());
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for (file, content) in [
        (UP_FILE, migration.up_content()),
        (DOWN_FILE, migration.down_content()),
    ] {
        let path = dir.join(file);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok((migration, dir))
}
