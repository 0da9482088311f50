//! # Shift Migrations
//!
//! Transactional SQL schema migrations for PostgreSQL, MySQL and SQLite.
//!
//! This crate provides:
//! - Versioned migrations read from disk or embedded in the binary
//! - A bookkeeping table recording applied versions
//! - Atomic apply and revert: content and bookkeeping commit together
//! - Drift detection between the source and the database
//!
//! ## Example
//!
//! ```rust,no_run
//! use shift_migrations::{Engine, MigrationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MigrationConfig::builder()
//!         .database_url("postgres://localhost/app")
//!         .migrations_dir("db/migrations")
//!         .build()?;
//!
//!     let engine = Engine::from_config(&config).await?;
//!     for migration in &engine.apply_pending().await? {
//!         println!("applied {migration}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod migration;
pub mod options;
pub mod pool;
pub mod source;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{DatabaseType, MigrationConfig, MigrationConfigBuilder};
pub use engine::{Engine, MigrationStatus};
pub use error::{MigrationError, Result};
pub use executor::{DatabaseExecutor, Executor};
pub use migration::{Clock, FixedClock, Migration, Migrations, SystemClock};
pub use options::MigrationOptions;
pub use pool::DatabasePool;
pub use source::{EmbeddedSource, FileSystemSource, Source};
pub use store::{DatabaseStore, Statements, Store};

/// Re-export sqlx types for convenience
pub use sqlx;

/// Re-export include_dir for building an [`EmbeddedSource`]
pub use include_dir;
