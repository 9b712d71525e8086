//! State management module
//!
//! Tracks the replication bookmark of every entity so the next run can
//! resume an incremental sync.
//!
//! # Overview
//!
//! - `State` - bookmarks keyed by entity name, serialized Singer-style
//! - `StateManager` - in-memory or file-backed store with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState};
