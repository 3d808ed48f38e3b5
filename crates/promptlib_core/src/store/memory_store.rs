//! In-process state store.

use crate::store::{StateStore, StoreResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// Map-backed store for hosts without durable storage, and for tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStateStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with pre-existing entries.
    pub fn with_entries(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Returns one stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self, keys: &[&str]) -> StoreResult<BTreeMap<String, Value>> {
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect())
    }

    fn write(&mut self, entries: BTreeMap<String, Value>) -> StoreResult<()> {
        self.entries.extend(entries);
        Ok(())
    }

    fn delete(&mut self, keys: &[&str]) -> StoreResult<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}
