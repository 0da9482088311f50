//! Migration configuration.

use crate::error::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Database type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL database.
    #[default]
    PostgreSQL,
    /// MySQL or MariaDB database.
    MySQL,
    /// SQLite database.
    SQLite,
}

impl DatabaseType {
    /// Parse from a database URL.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSQL => write!(f, "postgresql"),
            Self::MySQL => write!(f, "mysql"),
            Self::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawMigrationConfig")]
pub struct MigrationConfig {
    /// Database connection URL.
    pub database_url: String,

    /// Database type, detected from the URL unless given explicitly.
    pub database_type: DatabaseType,

    /// Directory holding one sub-directory per migration.
    pub migrations_dir: PathBuf,

    /// Table recording applied versions.
    pub table_name: String,

    /// Connection timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Maximum connection pool size.
    pub max_connections: u32,
}

/// Deserialized form of [`MigrationConfig`], before the database type is
/// resolved against the URL.
#[derive(Deserialize)]
struct RawMigrationConfig {
    database_url: String,
    #[serde(default)]
    database_type: Option<DatabaseType>,
    #[serde(default = "default_migrations_dir")]
    migrations_dir: PathBuf,
    #[serde(default = "default_table_name")]
    table_name: String,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    connect_timeout: Duration,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

impl From<RawMigrationConfig> for MigrationConfig {
    fn from(raw: RawMigrationConfig) -> Self {
        let database_type = raw
            .database_type
            .or_else(|| DatabaseType::from_url(&raw.database_url))
            .unwrap_or_default();

        Self {
            database_url: raw.database_url,
            database_type,
            migrations_dir: raw.migrations_dir,
            table_name: raw.table_name,
            connect_timeout: raw.connect_timeout,
            max_connections: raw.max_connections,
        }
    }
}

/// Default migrations directory.
pub const DEFAULT_MIGRATIONS_DIR: &str = "db/migrations";

/// Default bookkeeping table.
pub const DEFAULT_TABLE_NAME: &str = "schema_migrations";

fn default_migrations_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIGRATIONS_DIR)
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

// Migrations run one at a time; a second connection is never used.
fn default_max_connections() -> u32 {
    1
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_type: DatabaseType::PostgreSQL,
            migrations_dir: default_migrations_dir(),
            table_name: default_table_name(),
            connect_timeout: default_connect_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> MigrationConfigBuilder {
        MigrationConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(MigrationError::config("Database URL is required"));
        }

        match DatabaseType::from_url(&self.database_url) {
            None => {
                let scheme = self
                    .database_url
                    .split_once(':')
                    .map_or(self.database_url.as_str(), |(scheme, _)| scheme);
                return Err(MigrationError::UnsupportedDatabase(scheme.to_string()));
            }
            Some(detected) if detected != self.database_type => {
                return Err(MigrationError::config(format!(
                    "Database type {} does not match the {detected} URL",
                    self.database_type
                )));
            }
            Some(_) => {}
        }

        if !is_identifier(&self.table_name) {
            return Err(MigrationError::config(format!(
                "Table name {:?} is not a valid identifier",
                self.table_name
            )));
        }

        if self.max_connections == 0 {
            return Err(MigrationError::config(
                "Max connections must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Letters, digits and underscores, optionally schema-qualified with one dot.
fn is_identifier(name: &str) -> bool {
    let part_ok = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    match name.split_once('.') {
        Some((schema, table)) => part_ok(schema) && part_ok(table),
        None => part_ok(name),
    }
}

/// Builder for migration configuration.
#[derive(Debug, Default)]
pub struct MigrationConfigBuilder {
    config: MigrationConfig,
}

impl MigrationConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        // Auto-detect database type if possible
        if let Some(db_type) = DatabaseType::from_url(&url) {
            self.config.database_type = db_type;
        }
        self.config.database_url = url;
        self
    }

    /// Set the database type.
    #[must_use]
    pub fn database_type(mut self, db_type: DatabaseType) -> Self {
        self.config.database_type = db_type;
        self
    }

    /// Set the migrations directory.
    #[must_use]
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.migrations_dir = dir.into();
        self
    }

    /// Set the bookkeeping table name.
    #[must_use]
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.config.table_name = name.into();
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set maximum connections.
    #[must_use]
    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<MigrationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
