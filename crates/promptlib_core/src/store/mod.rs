//! Persistence gateway for the canonical state blob.
//!
//! # Responsibility
//! - Define the key-value contract the core persists through.
//! - Own the persisted key layout (`lists`, `prompts`, `settings`, legacy
//!   `promptLibrary`).
//!
//! # Invariants
//! - `write` is atomic: either every entry of one call lands or none does.
//! - Transport failures are surfaced as `StoreError` and never retried here.

use crate::db::DbError;
use crate::model::state::LibraryState;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStateStore;
pub use sqlite_store::SqliteStateStore;

pub const LISTS_KEY: &str = "lists";
pub const PROMPTS_KEY: &str = "prompts";
pub const SETTINGS_KEY: &str = "settings";
/// Key of the legacy single-blob layout.
pub const LEGACY_KEY: &str = "promptLibrary";

/// Every key read when loading state.
pub const LOAD_KEYS: [&str; 4] = [LISTS_KEY, PROMPTS_KEY, SETTINGS_KEY, LEGACY_KEY];

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence transport error.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap failure.
    Db(DbError),
    /// A value could not be encoded for storage.
    Encode(serde_json::Error),
    /// Backend refused the operation.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode stored value: {err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Key-value storage used by the library session.
pub trait StateStore {
    /// Reads the given keys. Absent keys are omitted from the result.
    fn read(&self, keys: &[&str]) -> StoreResult<BTreeMap<String, Value>>;
    /// Writes all entries atomically.
    fn write(&mut self, entries: BTreeMap<String, Value>) -> StoreResult<()>;
    /// Removes the given keys. Missing keys are ignored.
    fn delete(&mut self, keys: &[&str]) -> StoreResult<()>;
}

/// Raw blob assembled from one store read.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    /// Blob to feed the normalizer.
    pub raw: Value,
    /// Whether the legacy key was present and must be removed.
    pub has_legacy: bool,
    /// Whether the legacy blob was adopted as source of truth.
    pub adopted_legacy: bool,
}

impl StoredSnapshot {
    /// Chooses between modern keys and the legacy blob.
    ///
    /// Modern data exists when `lists` or `prompts` is an array or
    /// `settings` is an object; only then is the legacy blob ignored.
    pub fn from_entries(mut entries: BTreeMap<String, Value>) -> Self {
        let has_modern = entries.get(LISTS_KEY).is_some_and(Value::is_array)
            || entries.get(PROMPTS_KEY).is_some_and(Value::is_array)
            || entries.get(SETTINGS_KEY).is_some_and(Value::is_object);
        let legacy = entries.remove(LEGACY_KEY).filter(|value| !value.is_null());
        let has_legacy = legacy.is_some();

        if let Some(legacy) = legacy.filter(|_| !has_modern) {
            return Self {
                raw: legacy,
                has_legacy,
                adopted_legacy: true,
            };
        }

        let mut raw = Map::new();
        for key in [LISTS_KEY, PROMPTS_KEY, SETTINGS_KEY] {
            if let Some(value) = entries.remove(key) {
                raw.insert(key.to_string(), value);
            }
        }
        Self {
            raw: Value::Object(raw),
            has_legacy,
            adopted_legacy: false,
        }
    }
}

/// Splits canonical state into the three persisted entries.
pub fn state_entries(state: &LibraryState) -> StoreResult<BTreeMap<String, Value>> {
    Ok(BTreeMap::from([
        (LISTS_KEY.to_string(), serde_json::to_value(&state.lists)?),
        (PROMPTS_KEY.to_string(), serde_json::to_value(&state.prompts)?),
        (SETTINGS_KEY.to_string(), serde_json::to_value(&state.settings)?),
    ]))
}
