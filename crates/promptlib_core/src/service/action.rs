//! Typed action requests and dispatch payload decoding.
//!
//! # Invariants
//! - Id and name scalars are coerced like persisted fields: strings
//!   trimmed, numbers stringified, anything else treated as empty.
//! - Prompt `title` and `body` accept strings only; other values are empty.
//! - An explicitly empty `destinationListId` means "no destination".

use crate::normalize::shape::coerce_text;
use crate::service::mutation::ValidationError;
use serde_json::Value;

pub const GET_STATE: &str = "getState";
pub const CREATE_LIST: &str = "createList";
pub const SET_ACTIVE_LIST: &str = "setActiveList";
pub const CREATE_PROMPT: &str = "createPrompt";
pub const DELETE_PROMPT: &str = "deletePrompt";
pub const DELETE_LIST: &str = "deleteList";

/// One state-mutating user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateList {
        name: String,
    },
    SetActiveList {
        list_id: String,
    },
    /// `list_id = None` targets the active list.
    CreatePrompt {
        title: String,
        body: String,
        list_id: Option<String>,
    },
    DeletePrompt {
        prompt_id: String,
    },
    /// Without a destination the list's prompts are discarded.
    DeleteList {
        list_id: String,
        destination_list_id: Option<String>,
    },
}

impl Action {
    /// Dispatch name of this action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateList { .. } => CREATE_LIST,
            Self::SetActiveList { .. } => SET_ACTIVE_LIST,
            Self::CreatePrompt { .. } => CREATE_PROMPT,
            Self::DeletePrompt { .. } => DELETE_PROMPT,
            Self::DeleteList { .. } => DELETE_LIST,
        }
    }

    /// Decodes a named action and its untyped payload.
    ///
    /// # Errors
    /// - `ValidationError::UnsupportedAction` for unknown names (including
    ///   `getState`, which does not mutate).
    pub fn from_payload(action_name: &str, payload: &Value) -> Result<Self, ValidationError> {
        match action_name {
            CREATE_LIST => Ok(Self::CreateList {
                name: text(payload, &["name"]),
            }),
            SET_ACTIVE_LIST => Ok(Self::SetActiveList {
                list_id: text(payload, &["listId"]),
            }),
            CREATE_PROMPT => Ok(Self::CreatePrompt {
                title: string_only(payload, &["title"]),
                body: string_only(payload, &["body", "content"]),
                list_id: optional_text(payload, "listId"),
            }),
            DELETE_PROMPT => Ok(Self::DeletePrompt {
                prompt_id: text(payload, &["promptId"]),
            }),
            DELETE_LIST => Ok(Self::DeleteList {
                list_id: text(payload, &["listId"]),
                destination_list_id: optional_text(payload, "destinationListId")
                    .filter(|value| !value.is_empty()),
            }),
            other => Err(ValidationError::UnsupportedAction(other.to_string())),
        }
    }
}

fn text(payload: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| payload.get(*key).filter(|value| !value.is_null()))
        .and_then(coerce_text)
        .map(|coerced| coerced.value)
        .unwrap_or_default()
}

fn string_only(payload: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| payload.get(*key).filter(|value| !value.is_null()))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn optional_text(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .filter(|value| !value.is_null())
        .map(|value| coerce_text(value).map(|coerced| coerced.value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::Action;
    use crate::service::mutation::ValidationError;
    use serde_json::json;

    #[test]
    fn create_prompt_accepts_body_or_content_and_optional_list() {
        let action = Action::from_payload("createPrompt", &json!({ "content": " hi " })).unwrap();
        assert_eq!(
            action,
            Action::CreatePrompt {
                title: String::new(),
                body: "hi".to_string(),
                list_id: None,
            }
        );

        let action =
            Action::from_payload("createPrompt", &json!({ "body": "x", "listId": 42 })).unwrap();
        assert!(matches!(
            action,
            Action::CreatePrompt { list_id: Some(ref id), .. } if id == "42"
        ));
    }

    #[test]
    fn empty_destination_means_no_destination() {
        let action = Action::from_payload(
            "deleteList",
            &json!({ "listId": "a", "destinationListId": "  " }),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::DeleteList {
                list_id: "a".to_string(),
                destination_list_id: None,
            }
        );
    }

    #[test]
    fn prompt_text_fields_ignore_non_string_values() {
        let action = Action::from_payload(
            "createPrompt",
            &json!({ "title": 7, "body": true, "content": "unused" }),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::CreatePrompt {
                title: String::new(),
                body: String::new(),
                list_id: None,
            }
        );

        let action = Action::from_payload("createList", &json!({ "name": 2024 })).unwrap();
        assert_eq!(
            action,
            Action::CreateList {
                name: "2024".to_string()
            }
        );
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let err = Action::from_payload("renameList", &json!({})).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedAction("renameList".to_string()));
        assert_eq!(err.to_string(), "unsupported action: renameList");
    }
}
