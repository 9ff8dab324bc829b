//! lexi-store - SQLite chunk store
//!
//! This crate persists chunks, their metadata and their embeddings in a
//! single SQLite file that is recreated on every index rebuild.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

// Re-export schema for testing/migrations
pub use schema::{SCHEMA, SCHEMA_VERSION};
