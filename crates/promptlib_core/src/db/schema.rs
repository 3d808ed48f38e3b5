//! Layout of the `kv_entries` table.
//!
//! # Invariants
//! - Revision 0 is an empty file; `LAYOUT_VERSION` has `kv_entries`.
//! - Table creation and the `user_version` stamp commit together.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Table holding one JSON text row per state key.
pub const KV_TABLE: &str = "kv_entries";
/// Layout revision written by this build.
pub const LAYOUT_VERSION: u32 = 1;

const CREATE_KV_ENTRIES: &str = include_str!("kv_entries.sql");

/// Reads the layout revision stamped on `conn`.
pub fn layout_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings `conn` up to `LAYOUT_VERSION` and returns the revision found.
///
/// # Errors
/// - `DbError::LayoutTooNew` when the file is stamped above `LAYOUT_VERSION`;
///   the file is left untouched.
pub fn ensure_layout(conn: &mut Connection) -> DbResult<u32> {
    let found = layout_version(conn)?;
    if found > LAYOUT_VERSION {
        return Err(DbError::LayoutTooNew {
            found,
            supported: LAYOUT_VERSION,
        });
    }
    if found < LAYOUT_VERSION {
        let tx = conn.transaction()?;
        tx.execute_batch(CREATE_KV_ENTRIES)?;
        tx.pragma_update(None, "user_version", LAYOUT_VERSION)?;
        tx.commit()?;
        info!("event=kv_layout module=db status=upgraded from={found} to={LAYOUT_VERSION}");
    }
    Ok(found)
}

/// Fails unless `conn` already carries the `kv_entries` table.
pub fn require_kv_table(conn: &Connection) -> DbResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [KV_TABLE],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(DbError::MissingKvTable)
    }
}
