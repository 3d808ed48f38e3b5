//! Mutation engine: applies one action to canonical state.
//!
//! # Responsibility
//! - Validate action preconditions against the current state.
//! - Apply the change to a draft copy and re-normalize it.
//!
//! # Invariants
//! - The input state is never modified; failures leave no trace.
//! - Committed output is canonical (it went through the normalizer).
//! - New prompts are inserted at the front (newest-first).
//! - The `general` list can never be deleted.

use crate::id::IdGenerator;
use crate::model::list::PromptList;
use crate::model::prompt::Prompt;
use crate::model::state::LibraryState;
use crate::model::GENERAL_LIST_ID;
use crate::normalize::normalize_at;
use crate::service::action::Action;
use crate::service::library_service::ServiceError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-input precondition failure. Messages are safe to show end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// List name is blank after trim.
    ListNameRequired,
    /// Another list already uses this name (case-insensitive).
    DuplicateListName(String),
    /// List id is blank.
    ListIdRequired,
    /// Referenced list does not exist.
    ListNotFound(String),
    /// No list given and no active list to fall back to.
    NoActiveList,
    /// Prompt body is blank after trim.
    PromptBodyRequired,
    /// Prompt id is blank.
    PromptIdRequired,
    /// Referenced prompt does not exist.
    PromptNotFound(String),
    /// Attempt to delete the `general` list.
    GeneralListProtected,
    /// Delete destination equals the deleted list.
    DestinationIsSource,
    /// Delete destination does not exist.
    DestinationNotFound(String),
    /// Dispatch name is not a known action.
    UnsupportedAction(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListNameRequired => write!(f, "list name is required"),
            Self::DuplicateListName(name) => write!(f, "a list named `{name}` already exists"),
            Self::ListIdRequired => write!(f, "list id is required"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::NoActiveList => write!(f, "no active list is selected"),
            Self::PromptBodyRequired => write!(f, "prompt content is required"),
            Self::PromptIdRequired => write!(f, "prompt id is required"),
            Self::PromptNotFound(id) => write!(f, "prompt not found: {id}"),
            Self::GeneralListProtected => write!(f, "the General list cannot be deleted"),
            Self::DestinationIsSource => {
                write!(f, "destination list must differ from the deleted list")
            }
            Self::DestinationNotFound(id) => write!(f, "destination list not found: {id}"),
            Self::UnsupportedAction(name) => write!(f, "unsupported action: {name}"),
        }
    }
}

impl Error for ValidationError {}

/// Inputs an action needs besides its payload.
pub struct MutationContext<'a> {
    /// Timestamp stamped on every record touched by the action.
    pub now: &'a str,
    pub ids: &'a dyn IdGenerator,
}

/// Result of a successfully validated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed and must be persisted.
    Committed(LibraryState),
    /// Action was a no-op; nothing to persist.
    Unchanged,
}

/// Applies `action` to `current`.
///
/// # Errors
/// - `ServiceError::Validation` when any precondition fails; `current` is
///   left untouched.
/// - `ServiceError::Store` when the draft cannot be encoded for
///   re-normalization.
pub fn apply_action(
    current: &LibraryState,
    action: &Action,
    ctx: &MutationContext<'_>,
) -> Result<Outcome, ServiceError> {
    let mut draft = current.clone();
    match action {
        Action::CreateList { name } => create_list(&mut draft, name, ctx)?,
        Action::SetActiveList { list_id } => set_active_list(&mut draft, list_id)?,
        Action::CreatePrompt {
            title,
            body,
            list_id,
        } => create_prompt(&mut draft, title, body, list_id.as_deref(), ctx)?,
        Action::DeletePrompt { prompt_id } => delete_prompt(&mut draft, prompt_id, ctx)?,
        Action::DeleteList {
            list_id,
            destination_list_id,
        } => delete_list(&mut draft, list_id, destination_list_id.as_deref(), ctx)?,
    }

    let raw = serde_json::to_value(&draft).map_err(StoreError::from)?;
    let normalized = normalize_at(&raw, ctx.now);
    if normalized.changed || normalized.state != *current {
        Ok(Outcome::Committed(normalized.state))
    } else {
        Ok(Outcome::Unchanged)
    }
}

fn create_list(
    draft: &mut LibraryState,
    name: &str,
    ctx: &MutationContext<'_>,
) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::ListNameRequired);
    }
    if draft.lists.iter().any(|list| list.has_name(name)) {
        return Err(ValidationError::DuplicateListName(name.to_string()));
    }

    let order = draft.lists.iter().map(|list| list.order).max().unwrap_or(-1) + 1;
    let list = PromptList::new(ctx.ids.generate(), name, ctx.now, order);
    if draft.settings.active_list_id.is_empty() {
        draft.settings.active_list_id = list.id.clone();
    }
    draft.lists.push(list);
    Ok(())
}

fn set_active_list(draft: &mut LibraryState, list_id: &str) -> Result<(), ValidationError> {
    let list_id = required_list(draft, list_id)?;
    draft.settings.active_list_id = list_id;
    Ok(())
}

fn create_prompt(
    draft: &mut LibraryState,
    title: &str,
    body: &str,
    list_id: Option<&str>,
    ctx: &MutationContext<'_>,
) -> Result<(), ValidationError> {
    let list_id = list_id
        .unwrap_or(draft.settings.active_list_id.as_str())
        .trim()
        .to_string();
    if list_id.is_empty() {
        return Err(ValidationError::NoActiveList);
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(ValidationError::PromptBodyRequired);
    }
    if !draft.has_list(&list_id) {
        return Err(ValidationError::ListNotFound(list_id));
    }

    draft.prompts.insert(
        0,
        Prompt {
            id: ctx.ids.generate(),
            list_id: list_id.clone(),
            title: title.trim().to_string(),
            body: body.to_string(),
            created_at: ctx.now.to_string(),
            updated_at: ctx.now.to_string(),
        },
    );
    if draft.settings.active_list_id.is_empty() {
        draft.settings.active_list_id = list_id.clone();
    }
    touch_list(draft, &list_id, ctx.now);
    Ok(())
}

fn delete_prompt(
    draft: &mut LibraryState,
    prompt_id: &str,
    ctx: &MutationContext<'_>,
) -> Result<(), ValidationError> {
    let prompt_id = prompt_id.trim();
    if prompt_id.is_empty() {
        return Err(ValidationError::PromptIdRequired);
    }
    let index = draft
        .prompts
        .iter()
        .position(|prompt| prompt.id == prompt_id)
        .ok_or_else(|| ValidationError::PromptNotFound(prompt_id.to_string()))?;

    let removed = draft.prompts.remove(index);
    touch_list(draft, &removed.list_id, ctx.now);
    Ok(())
}

fn delete_list(
    draft: &mut LibraryState,
    list_id: &str,
    destination_list_id: Option<&str>,
    ctx: &MutationContext<'_>,
) -> Result<(), ValidationError> {
    let list_id = list_id.trim();
    if list_id.is_empty() {
        return Err(ValidationError::ListIdRequired);
    }
    if list_id == GENERAL_LIST_ID {
        return Err(ValidationError::GeneralListProtected);
    }
    if !draft.has_list(list_id) {
        return Err(ValidationError::ListNotFound(list_id.to_string()));
    }

    let destination = destination_list_id
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(destination) = destination {
        if destination == list_id {
            return Err(ValidationError::DestinationIsSource);
        }
        if !draft.has_list(destination) {
            return Err(ValidationError::DestinationNotFound(destination.to_string()));
        }
    }

    match destination {
        Some(destination) => {
            for prompt in draft
                .prompts
                .iter_mut()
                .filter(|prompt| prompt.list_id == list_id)
            {
                prompt.list_id = destination.to_string();
                prompt.updated_at = ctx.now.to_string();
            }
            touch_list(draft, destination, ctx.now);
        }
        None => draft.prompts.retain(|prompt| prompt.list_id != list_id),
    }

    draft.lists.retain(|list| list.id != list_id);
    if draft.settings.active_list_id == list_id {
        draft.settings.active_list_id = destination.unwrap_or(GENERAL_LIST_ID).to_string();
    }
    Ok(())
}

/// Validates a required list reference and returns it trimmed.
fn required_list(draft: &LibraryState, list_id: &str) -> Result<String, ValidationError> {
    let list_id = list_id.trim();
    if list_id.is_empty() {
        return Err(ValidationError::ListIdRequired);
    }
    if !draft.has_list(list_id) {
        return Err(ValidationError::ListNotFound(list_id.to_string()));
    }
    Ok(list_id.to_string())
}

fn touch_list(draft: &mut LibraryState, list_id: &str, now: &str) {
    if let Some(list) = draft.lists.iter_mut().find(|list| list.id == list_id) {
        list.updated_at = now.to_string();
    }
}
