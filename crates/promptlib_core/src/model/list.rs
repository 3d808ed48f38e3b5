//! Prompt list record.

use serde::Serialize;

/// Opaque list identifier.
pub type ListId = String;

/// Named, ordered collection of prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptList {
    pub id: ListId,
    /// Trimmed, never empty.
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    /// Equals the list position once normalized.
    pub order: i64,
}

impl PromptList {
    /// Creates a list whose timestamps both equal `now`.
    pub fn new(id: impl Into<ListId>, name: impl Into<String>, now: &str, order: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            order,
        }
    }

    /// Case-insensitive name comparison used for uniqueness checks.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}
