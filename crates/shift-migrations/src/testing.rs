//! Shared fixtures for database-backed unit tests.

use crate::config::{DatabaseType, MigrationConfig};
use crate::pool::DatabasePool;
use crate::store::DatabaseStore;
use std::sync::Arc;
use tempfile::TempDir;

/// A SQLite database in a temporary directory.
pub(crate) struct TestDb {
    pub(crate) pool: Arc<DatabasePool>,
    _dir: TempDir,
}

impl TestDb {
    pub(crate) async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let config = MigrationConfig::builder()
            .database_url(url)
            .max_connections(2)
            .build()
            .expect("valid config");
        let pool = DatabasePool::new(&config).await.expect("sqlite pool");

        Self {
            pool: Arc::new(pool),
            _dir: dir,
        }
    }

    pub(crate) fn store(&self) -> DatabaseStore {
        DatabaseStore::for_database(DatabaseType::SQLite, "schema_migrations")
    }

    pub(crate) async fn table_exists(&self, name: &str) -> bool {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(self.pool.inner())
        .await
        .expect("sqlite_master query");
        count > 0
    }

    pub(crate) async fn recorded_versions(&self) -> Vec<i64> {
        sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
            .fetch_all(self.pool.inner())
            .await
            .expect("schema_migrations query")
    }
}
