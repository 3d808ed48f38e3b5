//! Library session: cached canonical state plus persistence round-trip.
//!
//! # Responsibility
//! - Lazily load, normalize and (when repaired) write back stored state.
//! - Migrate the legacy single-blob layout and remove its key.
//! - Dispatch presentation-layer actions through the mutation engine.
//!
//! # Invariants
//! - The cache only ever holds state this session computed and, for
//!   mutations, successfully persisted.
//! - A failed write leaves both the cache and the store unchanged.
//! - The legacy key is removed only after the migrated state is written.
//! - Every committed action performs exactly one store write; no-op
//!   actions perform none.
//! - Dispatch is serialized by `&mut self`; there is no internal locking.

use crate::clock::{Clock, SystemClock};
use crate::id::{IdGenerator, RandomIdGenerator};
use crate::model::state::LibraryState;
use crate::normalize::normalize_at;
use crate::service::action::{Action, GET_STATE};
use crate::service::mutation::{apply_action, MutationContext, Outcome, ValidationError};
use crate::store::{state_entries, StateStore, StoreError, StoredSnapshot, LEGACY_KEY, LOAD_KEYS};
use log::{error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Error returned by session operations.
#[derive(Debug)]
pub enum ServiceError {
    /// User input violated an action precondition.
    Validation(ValidationError),
    /// Persistence transport failure, propagated unchanged.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Injectable state handle owned by the host application.
pub struct LibraryService<S: StateStore> {
    store: S,
    cache: Option<LibraryState>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl<S: StateStore> LibraryService<S> {
    /// Creates a session with random ids and the system clock.
    pub fn new(store: S) -> Self {
        Self::with_sources(store, RandomIdGenerator, SystemClock)
    }

    /// Creates a session with caller-provided id and time sources.
    pub fn with_sources(
        store: S,
        ids: impl IdGenerator + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            store,
            cache: None,
            ids: Box::new(ids),
            clock: Box::new(clock),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the session and returns the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns cached state without touching storage.
    pub fn cached_state(&self) -> Option<&LibraryState> {
        self.cache.as_ref()
    }

    /// Loads state on first call; later calls return the cache.
    ///
    /// # Side effects
    /// - Deletes the legacy key when present.
    /// - Writes normalized state back when any repair or migration applied.
    pub fn load(&mut self) -> Result<&LibraryState, StoreError> {
        let state = match self.cache.take() {
            Some(state) => state,
            None => self.load_from_store()?,
        };
        Ok(self.cache.insert(state))
    }

    /// Returns a snapshot of the current canonical state.
    pub fn get_state(&mut self) -> Result<LibraryState, StoreError> {
        self.load().cloned()
    }

    /// Applies one named action with an untyped payload.
    ///
    /// `getState` returns the current snapshot; every other name must be a
    /// mutating action.
    pub fn dispatch(
        &mut self,
        action_name: &str,
        payload: &Value,
    ) -> Result<LibraryState, ServiceError> {
        if action_name == GET_STATE {
            return Ok(self.get_state()?);
        }
        let action = Action::from_payload(action_name, payload).map_err(|err| {
            warn!("event=action_dispatch module=service status=rejected action={action_name}");
            err
        })?;
        self.apply(&action)
    }

    /// Applies one typed action, persisting the result when it changed.
    pub fn apply(&mut self, action: &Action) -> Result<LibraryState, ServiceError> {
        let started_at = Instant::now();
        let current = self.load()?.clone();
        let now = self.clock.now();
        let ctx = MutationContext {
            now: now.as_str(),
            ids: self.ids.as_ref(),
        };

        let outcome = match apply_action(&current, action, &ctx) {
            Ok(outcome) => outcome,
            Err(ServiceError::Validation(err)) => {
                info!(
                    "event=action_apply module=service status=rejected action={} reason={}",
                    action.name(),
                    validation_code(&err)
                );
                return Err(err.into());
            }
            Err(err) => {
                error!(
                    "event=action_apply module=service status=error action={} error={}",
                    action.name(),
                    err
                );
                return Err(err);
            }
        };

        let next = match outcome {
            Outcome::Unchanged => {
                info!(
                    "event=action_apply module=service status=noop action={}",
                    action.name()
                );
                return Ok(current);
            }
            Outcome::Committed(next) => next,
        };

        if let Err(err) = state_entries(&next).and_then(|entries| self.store.write(entries)) {
            error!(
                "event=action_apply module=service status=error action={} duration_ms={} error={}",
                action.name(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=action_apply module=service status=ok action={} lists={} prompts={} duration_ms={}",
            action.name(),
            next.lists.len(),
            next.prompts.len(),
            started_at.elapsed().as_millis()
        );
        self.cache = Some(next.clone());
        Ok(next)
    }

    pub fn create_list(&mut self, name: impl Into<String>) -> Result<LibraryState, ServiceError> {
        self.apply(&Action::CreateList { name: name.into() })
    }

    pub fn set_active_list(
        &mut self,
        list_id: impl Into<String>,
    ) -> Result<LibraryState, ServiceError> {
        self.apply(&Action::SetActiveList {
            list_id: list_id.into(),
        })
    }

    /// Creates a prompt in `list_id`, or in the active list when `None`.
    pub fn create_prompt(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        list_id: Option<String>,
    ) -> Result<LibraryState, ServiceError> {
        self.apply(&Action::CreatePrompt {
            title: title.into(),
            body: body.into(),
            list_id,
        })
    }

    pub fn delete_prompt(
        &mut self,
        prompt_id: impl Into<String>,
    ) -> Result<LibraryState, ServiceError> {
        self.apply(&Action::DeletePrompt {
            prompt_id: prompt_id.into(),
        })
    }

    /// Deletes a list, moving its prompts to `destination_list_id` if given.
    pub fn delete_list(
        &mut self,
        list_id: impl Into<String>,
        destination_list_id: Option<String>,
    ) -> Result<LibraryState, ServiceError> {
        self.apply(&Action::DeleteList {
            list_id: list_id.into(),
            destination_list_id,
        })
    }

    fn load_from_store(&mut self) -> Result<LibraryState, StoreError> {
        let started_at = Instant::now();
        info!("event=state_load module=service status=start");

        let entries = self.store.read(&LOAD_KEYS)?;
        let snapshot = StoredSnapshot::from_entries(entries);
        let now = self.clock.now();
        let normalized = normalize_at(&snapshot.raw, now.as_str());

        let needs_write = snapshot.has_legacy || normalized.changed;
        if needs_write {
            self.store.write(state_entries(&normalized.state)?)?;
        }
        if snapshot.has_legacy {
            self.store.delete(&[LEGACY_KEY])?;
        }

        info!(
            "event=state_load module=service status=ok legacy_adopted={} rewritten={} lists={} prompts={} repairs={} duration_ms={}",
            snapshot.adopted_legacy,
            needs_write,
            normalized.state.lists.len(),
            normalized.state.prompts.len(),
            normalized.repairs,
            started_at.elapsed().as_millis()
        );
        Ok(normalized.state)
    }
}

fn validation_code(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::ListNameRequired => "list_name_required",
        ValidationError::DuplicateListName(_) => "duplicate_list_name",
        ValidationError::ListIdRequired => "list_id_required",
        ValidationError::ListNotFound(_) => "list_not_found",
        ValidationError::NoActiveList => "no_active_list",
        ValidationError::PromptBodyRequired => "prompt_body_required",
        ValidationError::PromptIdRequired => "prompt_id_required",
        ValidationError::PromptNotFound(_) => "prompt_not_found",
        ValidationError::GeneralListProtected => "general_list_protected",
        ValidationError::DestinationIsSource => "destination_is_source",
        ValidationError::DestinationNotFound(_) => "destination_not_found",
        ValidationError::UnsupportedAction(_) => "unsupported_action",
    }
}
