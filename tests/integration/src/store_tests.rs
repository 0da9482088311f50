//! Store integration tests
//!
//! Custom stores plugged into the engine, and custom bookkeeping tables.

use crate::fixtures::*;
use crate::helpers::*;
use async_trait::async_trait;
use shift_migrations::sqlx::AnyConnection;
use shift_migrations::{
    DatabaseExecutor, DatabaseStore, DatabaseType, Engine, FileSystemSource, Migration,
    MigrationConfig, MigrationError, Migrations, Result, Store,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Keeps versions in memory, ignoring the connection.
#[derive(Clone, Default)]
struct MemoryStore {
    versions: Arc<Mutex<BTreeSet<i64>>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn collect(&self, _conn: &mut AnyConnection) -> Result<Migrations> {
        let versions = self.versions.lock().unwrap();
        Ok(versions.iter().copied().map(Migration::applied).collect())
    }

    async fn insert(&self, migration: &Migration, _conn: &mut AnyConnection) -> Result<()> {
        let version = migration.version();
        if !self.versions.lock().unwrap().insert(version) {
            return Err(MigrationError::AlreadyApplied { version });
        }
        Ok(())
    }

    async fn remove(&self, migration: &Migration, _conn: &mut AnyConnection) -> Result<()> {
        self.versions.lock().unwrap().remove(&migration.version());
        Ok(())
    }
}

async fn engine_with_store(db: &TestDatabase, store: impl Store + 'static) -> Engine {
    let pool = Arc::new(
        shift_migrations::DatabasePool::new(&db.config())
            .await
            .unwrap(),
    );
    Engine::new(
        FileSystemSource::new(db.migrations_dir()),
        store,
        DatabaseExecutor::new(Arc::clone(&pool)),
        pool,
    )
}

#[tokio::test]
async fn test_custom_store() {
    let db = TestDatabase::new();
    db.write_scenario();
    let store = MemoryStore::default();
    let engine = engine_with_store(&db, store.clone()).await;

    engine.apply_pending().await.unwrap();

    assert_eq!(
        store.versions.lock().unwrap().iter().copied().collect::<Vec<_>>(),
        vec![DOMAIN_MODEL, SEED_ADMIN]
    );
    assert_eq!(db.row_count(&engine, "users").await, 1);
    // Bookkeeping went to memory, not to the database.
    assert!(!db.table_exists(&engine, "schema_migrations").await);
}

#[tokio::test]
async fn test_custom_store_duplicate_rolls_back() {
    let db = TestDatabase::new();
    db.write_migration(DOMAIN_MODEL_DIR, DOMAIN_MODEL_UP, Some(DOMAIN_MODEL_DOWN));
    let store = MemoryStore::default();
    store.versions.lock().unwrap().insert(DOMAIN_MODEL);
    let engine = engine_with_store(&db, store).await;

    let migration = engine.known().unwrap().find(DOMAIN_MODEL).cloned().unwrap();
    let err = engine.apply(&migration).await.unwrap_err();

    assert!(matches!(err, MigrationError::AlreadyApplied { version: DOMAIN_MODEL }));
    assert!(!db.table_exists(&engine, "users").await);
}

#[tokio::test]
async fn test_custom_table_name() {
    let db = TestDatabase::new();
    db.write_scenario();
    let config = MigrationConfig {
        table_name: "applied_versions".to_string(),
        ..db.config()
    };
    let engine = Engine::from_config(&config).await.unwrap();

    engine.apply_pending().await.unwrap();

    assert!(db.table_exists(&engine, "applied_versions").await);
    assert!(!db.table_exists(&engine, "schema_migrations").await);
    assert_eq!(db.row_count(&engine, "applied_versions").await, 2);
}

#[tokio::test]
async fn test_engines_share_bookkeeping() {
    let db = TestDatabase::new();
    db.write_scenario();

    let first = db.engine().await;
    first.apply_pending().await.unwrap();

    let second = engine_with_store(
        &db,
        DatabaseStore::for_database(DatabaseType::SQLite, "schema_migrations"),
    )
    .await;
    assert!(second.unapplied().await.unwrap().is_empty());
    assert_eq!(
        second.current().await.unwrap().map(|m| m.version()),
        Some(SEED_ADMIN)
    );
}
