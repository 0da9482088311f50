//! Database connection pool management.

use crate::config::{DatabaseType, MigrationConfig};
use crate::error::{MigrationError, Result};
use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};

/// Database connection pool.
///
/// The pool belongs to the caller; the engine borrows one connection per
/// operation and hands it back when the operation returns.
#[derive(Clone)]
pub struct DatabasePool {
    pool: AnyPool,
    database_type: DatabaseType,
}

impl DatabasePool {
    /// Open a pool for the configured database.
    pub async fn new(config: &MigrationConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| MigrationError::connection(e.to_string()))?;

        Ok(Self {
            pool,
            database_type: config.database_type,
        })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: AnyPool, database_type: DatabaseType) -> Self {
        Self {
            pool,
            database_type,
        }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database type.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Acquire a connection.
    pub async fn acquire(&self) -> Result<PoolConnection<Any>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| MigrationError::connection(e.to_string()))
    }

    /// Test the connection.
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::connection(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("database_type", &self.database_type)
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}
