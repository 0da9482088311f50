//! Persisted record of applied migration versions.

use crate::config::DatabaseType;
use crate::error::{MigrationError, Result};
use crate::migration::{Migration, Migrations};
use async_trait::async_trait;
use sqlx::AnyConnection;
use tracing::debug;

/// Durable record of applied versions.
///
/// Every call runs on the handle it is given. The executor calls
/// [`prepare`](Store::prepare) on a plain connection, then passes its open
/// transaction to `insert` or `remove`, so the bookkeeping write commits or
/// rolls back together with the migration content.
#[async_trait]
pub trait Store: Send + Sync {
    /// Make the store ready for writes. Runs outside any transaction.
    async fn prepare(&self, _conn: &mut AnyConnection) -> Result<()> {
        Ok(())
    }

    /// All recorded versions, as content-less migrations in storage order.
    async fn collect(&self, conn: &mut AnyConnection) -> Result<Migrations>;

    /// Record a migration's version. Recording a version twice is an error.
    async fn insert(&self, migration: &Migration, conn: &mut AnyConnection) -> Result<()>;

    /// Forget a migration's version. Forgetting an unknown version is a no-op.
    async fn remove(&self, migration: &Migration, conn: &mut AnyConnection) -> Result<()>;
}

/// The four bookkeeping statements of one SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    /// Idempotent table creation.
    pub create_table: String,
    /// Insert one version; takes the version as its only parameter.
    pub insert: String,
    /// Delete one version; takes the version as its only parameter.
    pub remove: String,
    /// Select every version.
    pub select_all: String,
}

impl Statements {
    /// PostgreSQL statements.
    #[must_use]
    pub fn postgres(table: &str) -> Self {
        Self::with_placeholder(table, "$1")
    }

    /// MySQL statements.
    #[must_use]
    pub fn mysql(table: &str) -> Self {
        Self::with_placeholder(table, "?")
    }

    /// SQLite statements.
    #[must_use]
    pub fn sqlite(table: &str) -> Self {
        Self::with_placeholder(table, "?")
    }

    /// Statements for a database type.
    #[must_use]
    pub fn for_database(database_type: DatabaseType, table: &str) -> Self {
        match database_type {
            DatabaseType::PostgreSQL => Self::postgres(table),
            DatabaseType::MySQL => Self::mysql(table),
            DatabaseType::SQLite => Self::sqlite(table),
        }
    }

    fn with_placeholder(table: &str, placeholder: &str) -> Self {
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (version BIGINT PRIMARY KEY NOT NULL)"
            ),
            insert: format!("INSERT INTO {table} (version) VALUES ({placeholder})"),
            remove: format!("DELETE FROM {table} WHERE version = {placeholder}"),
            select_all: format!("SELECT version FROM {table}"),
        }
    }
}

/// A [`Store`] backed by a table in the target database.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    statements: Statements,
}

impl DatabaseStore {
    /// Create a store from dialect statements.
    #[must_use]
    pub fn new(statements: Statements) -> Self {
        Self { statements }
    }

    /// Create a store for a database type and table.
    #[must_use]
    pub fn for_database(database_type: DatabaseType, table: &str) -> Self {
        Self::new(Statements::for_database(database_type, table))
    }

    /// The statements in use.
    #[must_use]
    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    async fn ensure_table(&self, conn: &mut AnyConnection) -> Result<()> {
        sqlx::query(&self.statements.create_table)
            .execute(&mut *conn)
            .await
            .map_err(|e| MigrationError::persistence(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Store for DatabaseStore {
    // MySQL commits implicitly on any CREATE TABLE, so this must not share
    // the migration's transaction.
    async fn prepare(&self, conn: &mut AnyConnection) -> Result<()> {
        self.ensure_table(conn).await
    }

    async fn collect(&self, conn: &mut AnyConnection) -> Result<Migrations> {
        self.ensure_table(conn).await?;

        let versions: Vec<i64> = sqlx::query_scalar(&self.statements.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrationError::persistence(e.to_string()))?;

        debug!(count = versions.len(), "Collected applied versions");
        Ok(versions.into_iter().map(Migration::applied).collect())
    }

    async fn insert(&self, migration: &Migration, conn: &mut AnyConnection) -> Result<()> {
        let version = migration.version();
        sqlx::query(&self.statements.insert)
            .bind(version)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if duplicate {
                    MigrationError::AlreadyApplied { version }
                } else {
                    MigrationError::persistence(e.to_string())
                }
            })?;

        debug!(version, "Recorded migration");
        Ok(())
    }

    async fn remove(&self, migration: &Migration, conn: &mut AnyConnection) -> Result<()> {
        let version = migration.version();
        sqlx::query(&self.statements.remove)
            .bind(version)
            .execute(&mut *conn)
            .await
            .map_err(|e| MigrationError::persistence(e.to_string()))?;

        debug!(version, "Removed migration record");
        Ok(())
    }
}
