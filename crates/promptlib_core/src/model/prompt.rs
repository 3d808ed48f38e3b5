//! Prompt record.

use crate::model::list::ListId;
use serde::Serialize;

/// Opaque prompt identifier.
pub type PromptId = String;

/// Stored text snippet belonging to exactly one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: PromptId,
    pub list_id: ListId,
    /// Trimmed; may be empty.
    pub title: String,
    /// Trimmed; never empty in canonical state.
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}
