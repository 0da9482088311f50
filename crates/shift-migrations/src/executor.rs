//! Applies and reverts single migrations.
//!
//! The migration content and the store update run on the same connection,
//! inside one transaction unless the migration opts out. Either both take
//! effect or neither does. The store is prepared on that connection before
//! the transaction opens, so DDL it needs never commits the migration early.

use crate::error::{MigrationError, Result};
use crate::migration::Migration;
use crate::pool::DatabasePool;
use crate::store::Store;
use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};
use std::sync::Arc;
use tracing::{debug, info};

/// Executes migrations up and down.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run the forward content and record the version.
    async fn up(&self, migration: &Migration, store: &dyn Store) -> Result<()>;

    /// Run the reverse content and forget the version.
    async fn down(&self, migration: &Migration, store: &dyn Store) -> Result<()>;
}

/// Executor running migrations against a database pool.
#[derive(Debug, Clone)]
pub struct DatabaseExecutor {
    pool: Arc<DatabasePool>,
}

impl DatabaseExecutor {
    /// Create an executor over a pool.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Run `work` on a fresh connection, wrapped in a transaction when
    /// `transactional` is set.
    async fn run_unit(&self, transactional: bool, work: &dyn UnitOfWork) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        work.prepare(&mut conn).await?;

        if !transactional {
            return work.run(&mut conn).await;
        }

        let mut tx = Connection::begin(&mut *conn)
            .await
            .map_err(|e| MigrationError::Transaction(e.to_string()))?;
        debug!("Transaction started");

        match work.run(&mut tx).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| MigrationError::Transaction(e.to_string()))?;
                debug!("Transaction committed");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    return Err(MigrationError::Transaction(format!(
                        "{e}; rollback failed: {rollback}"
                    )));
                }
                debug!("Transaction rolled back");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Executor for DatabaseExecutor {
    async fn up(&self, migration: &Migration, store: &dyn Store) -> Result<()> {
        info!(version = migration.version(), path = migration.path(), "Applying migration");

        let step = Step {
            migration,
            store,
            direction: Direction::Up,
        };
        self.run_unit(migration.options().transaction, &step).await
    }

    async fn down(&self, migration: &Migration, store: &dyn Store) -> Result<()> {
        if !migration.reversible() {
            return Err(MigrationError::Irreversible {
                version: migration.version(),
            });
        }

        info!(version = migration.version(), path = migration.path(), "Reverting migration");

        let step = Step {
            migration,
            store,
            direction: Direction::Down,
        };
        self.run_unit(migration.options().transaction, &step).await
    }
}

/// Work performed on one connection or transaction.
#[async_trait]
trait UnitOfWork: Send + Sync {
    async fn prepare(&self, conn: &mut AnyConnection) -> Result<()>;

    async fn run(&self, conn: &mut AnyConnection) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Execute one side of a migration, then update the store.
struct Step<'a> {
    migration: &'a Migration,
    store: &'a dyn Store,
    direction: Direction,
}

#[async_trait]
impl<'a> UnitOfWork for Step<'a> {
    async fn prepare(&self, conn: &mut AnyConnection) -> Result<()> {
        self.store.prepare(conn).await
    }

    async fn run(&self, conn: &mut AnyConnection) -> Result<()> {
        let version = self.migration.version();
        let content = match self.direction {
            Direction::Up => self.migration.up_content(),
            Direction::Down => self.migration.down_content(),
        };

        // No arguments: sent as a simple query, so multi-statement scripts run.
        sqlx::Executor::execute(&mut *conn, content)
            .await
            .map_err(|e| MigrationError::Execution {
                version,
                reason: e.to_string(),
            })?;

        match self.direction {
            Direction::Up => self.store.insert(self.migration, conn).await,
            Direction::Down => self.store.remove(self.migration, conn).await,
        }
    }
}
