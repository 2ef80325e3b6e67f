//! SQLite persistence adapter.
//!
//! Implements every store port on a Diesel connection pool, with the schema
//! managed by embedded migrations.

pub mod database;
pub mod store;

pub use store::SqliteStore;
