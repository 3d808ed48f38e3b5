//! Canonical domain model for the prompt library.
//!
//! # Responsibility
//! - Define the lists/prompts/settings records shared by normalizer and
//!   mutation engine.
//! - Encode canonical state into its persisted JSON field layout.
//!
//! # Invariants
//! - Every record is identified by an opaque, non-empty string id.
//! - `GENERAL_LIST_ID` always names the first, non-deletable list.

pub mod list;
pub mod prompt;
pub mod state;

/// Id of the protected default list.
pub const GENERAL_LIST_ID: &str = "general";
/// Display name of the protected default list.
pub const GENERAL_LIST_NAME: &str = "General";
/// Schema version stamped on every canonical settings record.
pub const SCHEMA_VERSION: i64 = 2;
