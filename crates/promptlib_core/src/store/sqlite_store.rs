//! SQLite-backed state store.
//!
//! # Responsibility
//! - Persist each state key as one JSON text row in `kv_entries`.
//!
//! # Invariants
//! - One `write` call runs in a single immediate transaction.
//! - Rows holding unparsable JSON are surfaced as raw strings so the
//!   normalizer can repair them instead of failing the load.

use crate::db::schema::require_kv_table;
use crate::db::{open_db, open_db_in_memory};
use crate::store::{StateStore, StoreError, StoreResult};
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// State store over a migrated SQLite connection.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Wraps a connection, verifying the key-value table exists.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        require_kv_table(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a migrated in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Gives the connection back to the caller.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl StateStore for SqliteStateStore {
    fn read(&self, keys: &[&str]) -> StoreResult<BTreeMap<String, Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_entries WHERE key = ?1;")?;
        let mut entries = BTreeMap::new();
        for key in keys {
            let stored: Option<String> = stmt
                .query_row([*key], |row| row.get(0))
                .optional()?;
            let Some(text) = stored else {
                continue;
            };
            let value = match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        "event=store_read module=store status=invalid_json key={} error={}",
                        key, err
                    );
                    Value::String(text)
                }
            };
            entries.insert(key.to_string(), value);
        }
        Ok(entries)
    }

    fn write(&mut self, entries: BTreeMap<String, Value>) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in &entries {
            let text = serde_json::to_string(value)?;
            tx.execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, text],
            )?;
        }
        tx.commit().map_err(|err| {
            error!(
                "event=store_write module=store status=error keys={} error={}",
                entries.len(),
                err
            );
            StoreError::from(err)
        })
    }

    fn delete(&mut self, keys: &[&str]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv_entries WHERE key = ?1;", [*key])?;
        }
        tx.commit()?;
        Ok(())
    }
}
