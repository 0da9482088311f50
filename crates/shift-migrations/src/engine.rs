//! Migration engine.

use crate::config::MigrationConfig;
use crate::error::Result;
use crate::executor::{DatabaseExecutor, Executor};
use crate::migration::{Migration, Migrations};
use crate::pool::DatabasePool;
use crate::source::{FileSystemSource, Source};
use crate::store::{DatabaseStore, Store};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a database stands relative to its migration source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Recorded versions, ascending.
    pub applied: Vec<i64>,
    /// Source versions not yet recorded, ascending.
    pub pending: Vec<i64>,
    /// Recorded versions the source no longer has.
    pub missing: Vec<i64>,
    /// Highest recorded version, when the source still has it.
    pub current: Option<i64>,
}

impl MigrationStatus {
    /// True when nothing is pending.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// True when the store records versions the source lacks.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Composes a [`Source`], a [`Store`] and an [`Executor`].
///
/// Every operation runs to completion before returning and migrations are
/// applied one at a time. Nothing coordinates two engines pointed at the same
/// database: there is no advisory lock, so concurrent runs from separate
/// processes can race to apply the same version. The store's primary key makes
/// the loser fail rather than apply twice.
pub struct Engine {
    source: Box<dyn Source>,
    store: Box<dyn Store>,
    executor: Box<dyn Executor>,
    pool: Arc<DatabasePool>,
}

impl Engine {
    /// Create an engine from its parts.
    pub fn new(
        source: impl Source + 'static,
        store: impl Store + 'static,
        executor: impl Executor + 'static,
        pool: Arc<DatabasePool>,
    ) -> Self {
        Self {
            source: Box::new(source),
            store: Box::new(store),
            executor: Box::new(executor),
            pool,
        }
    }

    /// Open a pool and wire a filesystem source, a database store and a
    /// database executor from configuration.
    pub async fn from_config(config: &MigrationConfig) -> Result<Self> {
        config.validate()?;

        let pool = Arc::new(DatabasePool::new(config).await?);
        debug!(database_type = %config.database_type, table = %config.table_name, "Engine connected");

        Ok(Self::new(
            FileSystemSource::new(&config.migrations_dir),
            DatabaseStore::for_database(config.database_type, &config.table_name),
            DatabaseExecutor::new(Arc::clone(&pool)),
            pool,
        ))
    }

    /// The pool the engine borrows connections from.
    #[must_use]
    pub fn pool(&self) -> &Arc<DatabasePool> {
        &self.pool
    }

    /// Every migration the source knows, ascending.
    pub fn known(&self) -> Result<Migrations> {
        self.source.collect()
    }

    /// Recorded versions, ascending, as content-less migrations.
    pub async fn applied(&self) -> Result<Migrations> {
        let mut conn = self.pool.acquire().await?;
        let applied = self.store.collect(&mut conn).await?;
        Ok(applied.sorted())
    }

    /// The ready-to-apply queue, ascending.
    ///
    /// This is the symmetric difference of source and store, so a recorded
    /// version missing from the source appears here as a content-less entry.
    pub async fn unapplied(&self) -> Result<Migrations> {
        let known = self.source.collect()?;
        let applied = self.applied().await?;
        Ok(known.except(&applied).sorted())
    }

    /// The highest recorded migration, resolved against the source.
    ///
    /// Returns `None` when nothing is recorded or when the highest recorded
    /// version has no source entry; only the source carries reverse content.
    pub async fn current(&self) -> Result<Option<Migration>> {
        let known = self.source.collect()?;
        let applied = self.applied().await?;

        let Some(latest) = applied.current() else {
            return Ok(None);
        };
        Ok(known.find(latest.version()).cloned())
    }

    /// Apply one migration.
    pub async fn apply(&self, migration: &Migration) -> Result<()> {
        self.executor.up(migration, self.store.as_ref()).await
    }

    /// Revert one migration.
    pub async fn revert(&self, migration: &Migration) -> Result<()> {
        self.executor.down(migration, self.store.as_ref()).await
    }

    /// Apply every pending migration in ascending order.
    ///
    /// Stops at the first failure; migrations applied before it stay
    /// committed. Content-less entries are never run.
    pub async fn apply_pending(&self) -> Result<Migrations> {
        let pending = self.unapplied().await?;
        let mut applied = Migrations::new();

        for migration in pending.into_iter().filter(Migration::persistable) {
            self.apply(&migration).await?;
            applied.push(migration);
        }

        info!(count = applied.len(), "Applied pending migrations");
        Ok(applied)
    }

    /// Revert the current migration, if there is one.
    pub async fn revert_current(&self) -> Result<Option<Migration>> {
        let Some(current) = self.current().await? else {
            return Ok(None);
        };

        self.revert(&current).await?;
        Ok(Some(current))
    }

    /// Compare source and store.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let known = self.source.collect()?;
        let applied = self.applied().await?;

        let (pending, missing): (Vec<_>, Vec<_>) = known
            .except(&applied)
            .sorted()
            .iter()
            .map(Migration::version)
            .partition(|version| known.find(*version).is_some());

        let current = applied
            .current()
            .map(Migration::version)
            .filter(|version| known.find(*version).is_some());

        Ok(MigrationStatus {
            applied: applied.versions(),
            pending,
            missing,
            current,
        })
    }
}
