//! Storage layer for threads.
//!
//! - [`schema`]: DDL for SQLite and Postgres, plus column metadata
//! - [`migrations`]: versioned scripts applied on open
//! - [`backend`]: the [`Backend`] capability the models run against
//! - [`sqlite`]: the rusqlite implementation

pub mod backend;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use backend::{Backend, Condition, Filter, Row};
pub use schema::{ColumnKind, POSTGRES_SCHEMA_SQL, Table};
pub use sqlite::SqliteBackend;
