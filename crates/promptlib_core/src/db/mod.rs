//! SQLite file backing the key-value state store.
//!
//! # Responsibility
//! - Open connections with the `kv_entries` layout in place.
//! - Refuse files laid out by a newer build.
//!
//! # Invariants
//! - The layout revision is stamped in `PRAGMA user_version`.
//! - Store code never touches a connection that did not pass `schema`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or validating the state database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File carries a layout revision this build cannot read.
    LayoutTooNew { found: u32, supported: u32 },
    /// Connection has no `kv_entries` table.
    MissingKvTable,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::LayoutTooNew { found, supported } => write!(
                f,
                "state database layout v{found} was written by a newer build (this build reads up to v{supported})"
            ),
            Self::MissingKvTable => write!(f, "state database has no `kv_entries` table"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::LayoutTooNew { .. } | Self::MissingKvTable => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
