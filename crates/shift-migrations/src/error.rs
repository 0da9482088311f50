//! Migration error types.

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Migration error type.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The migration source could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A migration directory has no forward content.
    #[error("Migration {path} has no up.sql")]
    MissingContent {
        /// Path of the offending migration.
        path: String,
    },

    /// A migration name does not start with a numeric version.
    #[error("Cannot extract version from {name}")]
    MalformedVersion {
        /// Name the version was parsed from.
        name: String,
    },

    /// Two migrations in one source share a version.
    #[error("Duplicate migration version: {version}")]
    DuplicateVersion {
        /// The repeated version.
        version: i64,
    },

    /// The options document of a migration could not be parsed.
    #[error("Invalid options for migration {path}: {reason}")]
    InvalidOptions {
        /// Path of the offending migration.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// Revert was requested for a migration without reverse content.
    #[error("cannot reverse migration {version}")]
    Irreversible {
        /// Migration version.
        version: i64,
    },

    /// The version is already recorded in the store.
    #[error("Migration {version} has already been applied")]
    AlreadyApplied {
        /// Migration version.
        version: i64,
    },

    /// Bookkeeping table error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Forward or reverse content failed to execute.
    #[error("Migration {version} failed: {reason}")]
    Execution {
        /// Migration version.
        version: i64,
        /// Failure reason.
        reason: String,
    },

    /// Transaction begin, commit or rollback failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database not supported.
    #[error("Database type not supported: {0}")]
    UnsupportedDatabase(String),
}

impl MigrationError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// The migration version this error is about, when it carries one.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        match self {
            Self::DuplicateVersion { version }
            | Self::Irreversible { version }
            | Self::AlreadyApplied { version }
            | Self::Execution { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Whether the error came from reading or validating a migration source.
    #[must_use]
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::MissingContent { .. }
                | Self::MalformedVersion { .. }
                | Self::DuplicateVersion { .. }
                | Self::InvalidOptions { .. }
        )
    }
}
