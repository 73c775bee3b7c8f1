//! Destination stores for loaded card packs.
//!
//! ## Stores
//!
//! Each store wraps an sqlx pool and implements [`Store`]:
//!
//! | Type | `--db-type` |
//! |------|-------------|
//! | [`SqliteDestination`] | `sqlite` |
//! | [`PostgresDestination`] | `postgres` |
//!
//! Table DDL and schema qualification are shared through [`schema`]; only
//! connection setup, placeholder syntax and duplicate-key detection differ per
//! store.
//!
//! ## Conflict classification
//!
//! Each store maps its native error codes onto [`InsertErrorClass`], so the
//! load coordinator never looks at driver-specific error shapes.

mod postgres;
pub(crate) mod schema;
mod sqlite;
mod traits;

pub use postgres::PostgresDestination;
pub use sqlite::SqliteDestination;
pub use traits::Store;

use std::fmt;

/// Supported destination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbKind::Sqlite => f.write_str("sqlite"),
            DbKind::Postgres => f.write_str("postgres"),
        }
    }
}

/// How a failed row insert should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertErrorClass {
    /// The primary key already exists; skip the row.
    Conflict,
    /// Anything else; abort the unit of work.
    Fatal,
}

/// Errors from the destination store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Could not reach {kind} destination: {source}")]
    Connection {
        kind: DbKind,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to provision table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to insert {entity} {key}: {source}")]
    FatalInsert {
        entity: &'static str,
        key: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
