//! Core domain logic for the prompt library.
//! This crate is the single source of truth for state invariants.

pub mod clock;
pub mod db;
pub mod id;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod service;
pub mod store;

pub use clock::{now_timestamp, Clock, SystemClock};
pub use id::{generate_id, IdGenerator, RandomIdGenerator};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::list::{ListId, PromptList};
pub use model::prompt::{Prompt, PromptId};
pub use model::state::{LibraryState, Settings};
pub use model::{GENERAL_LIST_ID, GENERAL_LIST_NAME, SCHEMA_VERSION};
pub use normalize::{normalize, normalize_at, Normalized, Repairs};
pub use service::action::Action;
pub use service::library_service::{LibraryService, ServiceError};
pub use service::mutation::{apply_action, MutationContext, Outcome, ValidationError};
pub use store::{
    MemoryStateStore, SqliteStateStore, StateStore, StoreError, StoreResult, StoredSnapshot,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
