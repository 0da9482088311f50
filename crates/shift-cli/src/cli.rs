//! CLI argument definitions using clap.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shift_migrations::config::{DEFAULT_MIGRATIONS_DIR, DEFAULT_TABLE_NAME};
use shift_migrations::{Engine, MigrationConfig};
use std::path::PathBuf;

use crate::commands;
use crate::output::OutputFormat;

/// shift - transactional SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "shift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Database connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,

    /// Directory holding one sub-directory per migration
    #[arg(long, env = "DATABASE_MIGRATIONS", default_value = DEFAULT_MIGRATIONS_DIR, global = true)]
    pub src: PathBuf,

    /// Table recording applied versions
    #[arg(long, default_value = DEFAULT_TABLE_NAME, global = true)]
    pub table: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply new migrations
    Up,

    /// Revert the last applied migration
    Down,

    /// Show applied, pending and missing migrations
    Status,

    /// Create a new migration directory
    New(commands::new::NewArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let format = OutputFormat::from_json_flag(self.json);

        match &self.command {
            Commands::New(args) => commands::new::execute(args, &self.src, format),
            Commands::Up => commands::up::execute(&self.engine().await?, format).await,
            Commands::Down => commands::down::execute(&self.engine().await?, format).await,
            Commands::Status => commands::status::execute(&self.engine().await?, format).await,
        }
    }

    /// Build the engine configuration from flags and environment.
    pub fn migration_config(&self) -> Result<MigrationConfig> {
        let Some(database_url) = self.database_url.as_deref() else {
            bail!("DATABASE_URL environment variable or --database-url required");
        };

        MigrationConfig::builder()
            .database_url(database_url)
            .migrations_dir(&self.src)
            .table_name(&self.table)
            .build()
            .context("Invalid configuration")
    }

    async fn engine(&self) -> Result<Engine> {
        let config = self.migration_config()?;
        Engine::from_config(&config)
            .await
            .context("Failed to connect")
    }
}
