//! Integration tests for shift schema migrations
//!
//! This crate covers end-to-end flows against real SQLite database files:
//! - Applying and reverting in version order
//! - Drift between the migration source and the bookkeeping table
//! - Atomicity of content and bookkeeping
//! - Embedded sources and custom stores

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;

#[cfg(test)]
mod store_tests;
