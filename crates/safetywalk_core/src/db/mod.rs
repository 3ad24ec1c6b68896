//! Local SQLite backing for the POI store used by the CLI and tests.
//!
//! Hosts that bring their own repository never touch this module; it only
//! exists so `SqlitePoiStore` has a schema to read and write.
//!
//! # Invariants
//! - `pois` and `poi_types` are never queried before `apply_migrations` returns.
//! - A store written by a newer build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `PRAGMA user_version` is ahead of the newest bundled migration.
    SchemaTooNew { found: u32, supported: u32 },
    /// A bundled migration script failed; nothing from the batch was kept.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "poi store: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "poi store was written by a newer build (schema v{found}, this build reads up to v{supported})"
            ),
            Self::Migration { version, source } => {
                write!(f, "poi store migration v{version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
