//! Whole-library canonical state.
//!
//! # Invariants
//! - Produced only by the normalizer; see `crate::normalize`.
//! - `prompts` is kept newest-first.

use crate::model::list::{ListId, PromptList};
use crate::model::prompt::Prompt;
use crate::model::{GENERAL_LIST_ID, SCHEMA_VERSION};
use serde::Serialize;

/// Process-wide settings record, re-derived on every normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub active_list_id: ListId,
    pub schema_version: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_list_id: GENERAL_LIST_ID.to_string(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// Canonical `{lists, prompts, settings}` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryState {
    pub lists: Vec<PromptList>,
    pub prompts: Vec<Prompt>,
    pub settings: Settings,
}

impl LibraryState {
    /// Loads one list by exact id.
    pub fn list_by_id(&self, list_id: &str) -> Option<&PromptList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    /// Loads one prompt by exact id.
    pub fn prompt_by_id(&self, prompt_id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|prompt| prompt.id == prompt_id)
    }

    pub fn has_list(&self, list_id: &str) -> bool {
        self.list_by_id(list_id).is_some()
    }

    /// Returns the active list, if the settings reference resolves.
    pub fn active_list(&self) -> Option<&PromptList> {
        self.list_by_id(self.settings.active_list_id.as_str())
    }

    /// Prompts of one list in newest-first order.
    pub fn prompts_in_list<'a>(&'a self, list_id: &'a str) -> impl Iterator<Item = &'a Prompt> {
        self.prompts
            .iter()
            .filter(move |prompt| prompt.list_id == list_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{LibraryState, Settings};
    use crate::model::list::PromptList;
    use crate::model::prompt::Prompt;

    fn prompt(id: &str, list_id: &str) -> Prompt {
        Prompt {
            id: id.to_string(),
            list_id: list_id.to_string(),
            title: String::new(),
            body: format!("body {id}"),
            created_at: "t0".to_string(),
            updated_at: "t0".to_string(),
        }
    }

    #[test]
    fn prompts_in_list_keeps_sequence_order() {
        let state = LibraryState {
            lists: vec![
                PromptList::new("general", "General", "t0", 0),
                PromptList::new("w", "Work", "t0", 1),
            ],
            prompts: vec![prompt("p3", "w"), prompt("p2", "general"), prompt("p1", "w")],
            settings: Settings::default(),
        };

        let ids: Vec<&str> = state
            .prompts_in_list("w")
            .map(|prompt| prompt.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p3", "p1"]);
        assert_eq!(state.active_list().map(|list| list.id.as_str()), Some("general"));
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let state = LibraryState {
            lists: vec![PromptList::new("general", "General", "t0", 0)],
            prompts: vec![prompt("p1", "general")],
            settings: Settings::default(),
        };

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["prompts"][0]["listId"], "general");
        assert_eq!(value["lists"][0]["createdAt"], "t0");
        assert_eq!(value["settings"]["activeListId"], "general");
        assert_eq!(value["settings"]["schemaVersion"], 2);
        assert_eq!(value["lists"][0]["order"], 0);
    }
}
