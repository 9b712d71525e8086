//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmarks of every entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-entity state, keyed by entity name
    #[serde(default, rename = "bookmarks", alias = "streams")]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for an entity
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for an entity, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Bookmarked replication value of an entity
    pub fn get_bookmark(&self, stream: &str) -> Option<&str> {
        self.streams.get(stream)?.replication_key_value.as_deref()
    }

    /// Record the replication value reached for an entity
    pub fn set_bookmark(&mut self, stream: &str, key: &str, value: impl Into<String>) {
        let entry = self.get_stream_mut(stream);
        entry.replication_key = Some(key.to_string());
        entry.replication_key_value = Some(value.into());
    }
}

/// State of a single entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Field the bookmark refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Highest replication value synced so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<String>,
}
