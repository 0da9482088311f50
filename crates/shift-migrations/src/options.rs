//! Per-migration options.

use crate::error::{MigrationError, Result};
use serde::{Deserialize, Serialize};

/// File name of the options document inside a migration directory.
pub const OPTIONS_FILE: &str = "options.json";

/// Options for a single migration.
///
/// Not every database honours every option. MySQL, for one, commits DDL
/// implicitly, so `transaction` only protects the bookkeeping write there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Run the content and the bookkeeping update in one transaction.
    #[serde(default = "default_true")]
    pub transaction: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self { transaction: true }
    }
}

impl MigrationOptions {
    /// Options for a migration that must run outside a transaction,
    /// e.g. `CREATE INDEX CONCURRENTLY` on PostgreSQL.
    #[must_use]
    pub fn without_transaction() -> Self {
        Self { transaction: false }
    }

    /// Parse an options document. `None` yields the defaults.
    pub fn parse(path: &str, data: Option<&str>) -> Result<Self> {
        let Some(data) = data else {
            return Ok(Self::default());
        };

        serde_json::from_str(data).map_err(|e| MigrationError::InvalidOptions {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}
