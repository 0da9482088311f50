//! Test helper utilities for integration tests

use once_cell::sync::Lazy;
use shift_migrations::{Engine, MigrationConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use crate::fixtures::{
    DOMAIN_MODEL_DIR, DOMAIN_MODEL_DOWN, DOMAIN_MODEL_UP, SEED_ADMIN_DIR, SEED_ADMIN_UP,
};

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Write a migration directory under `src`.
pub fn write_migration(src: &Path, name: &str, up: &str, down: Option<&str>) -> PathBuf {
    let dir = src.join(name);
    std::fs::create_dir_all(&dir).expect("Failed to create migration dir");
    std::fs::write(dir.join("up.sql"), up).expect("Failed to write up.sql");
    if let Some(down) = down {
        std::fs::write(dir.join("down.sql"), down).expect("Failed to write down.sql");
    }
    dir
}

/// A SQLite database file and a migrations directory, both temporary.
pub struct TestDatabase {
    dir: TempDir,
}

impl TestDatabase {
    /// Create an empty database and migrations directory.
    pub fn new() -> Self {
        init_tracing();

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("migrations"))
            .expect("Failed to create migrations dir");
        Self { dir }
    }

    /// Directory the engine reads migrations from.
    pub fn migrations_dir(&self) -> PathBuf {
        self.dir.path().join("migrations")
    }

    /// SQLite URL of the database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.dir.path().join("test.db").display())
    }

    /// Engine configuration for this database.
    pub fn config(&self) -> MigrationConfig {
        MigrationConfig::builder()
            .database_url(self.database_url())
            .migrations_dir(self.migrations_dir())
            .max_connections(2)
            .build()
            .expect("Invalid test config")
    }

    /// Open an engine over this database.
    pub async fn engine(&self) -> Engine {
        Engine::from_config(&self.config())
            .await
            .expect("Failed to open engine")
    }

    /// Add a migration to the source.
    pub fn write_migration(&self, name: &str, up: &str, down: Option<&str>) -> PathBuf {
        write_migration(&self.migrations_dir(), name, up, down)
    }

    /// Delete a migration from the source.
    pub fn remove_migration(&self, name: &str) {
        std::fs::remove_dir_all(self.migrations_dir().join(name))
            .expect("Failed to remove migration");
    }

    /// Write the two-step domain model and seed scenario.
    pub fn write_scenario(&self) {
        self.write_migration(DOMAIN_MODEL_DIR, DOMAIN_MODEL_UP, Some(DOMAIN_MODEL_DOWN));
        self.write_migration(SEED_ADMIN_DIR, SEED_ADMIN_UP, None);
    }

    /// Whether a table exists.
    pub async fn table_exists(&self, engine: &Engine, name: &str) -> bool {
        let count: i64 = shift_migrations::sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(engine.pool().inner())
        .await
        .expect("sqlite_master query failed");
        count > 0
    }

    /// Number of rows in a table.
    pub async fn row_count(&self, engine: &Engine, table: &str) -> i64 {
        shift_migrations::sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(engine.pool().inner())
            .await
            .expect("count query failed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}
