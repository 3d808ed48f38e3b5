//! Core use-case services.
//!
//! # Responsibility
//! - Decode presentation-layer actions into typed requests.
//! - Apply actions to canonical state (mutation engine).
//! - Own the session cache and the persistence round-trip.

pub mod action;
pub mod library_service;
pub mod mutation;
