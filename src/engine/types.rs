//! Engine types
//!
//! Message types and configuration for the sync engine.

use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A Singer-style message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// One record of an entity
    Record {
        /// Entity name
        stream: String,
        /// The record
        record: Record,
        /// When the page holding the record was received
        time_extracted: DateTime<Utc>,
    },
    /// Snapshot of all bookmarks
    State {
        /// Serialized state
        value: JsonValue,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Record, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Drop records older than the bookmark or start date
    pub incremental: bool,
    /// Earliest replication value when no bookmark exists
    pub start_date: Option<DateTime<Utc>>,
    /// Stop each entity after this many pages
    pub max_pages: Option<usize>,
    /// Entities synced at once
    pub concurrency: usize,
    /// Abort the run on the first failed entity
    pub fail_fast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            start_date: None,
            max_pages: None,
            concurrency: 1,
            fail_fast: false,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take incremental settings from tap configuration
    #[must_use]
    pub fn from_tap_config(config: &TapConfig) -> Self {
        Self {
            incremental: config.incremental_sync,
            start_date: config.start_date,
            ..Self::default()
        }
    }

    /// Enable or disable incremental filtering
    #[must_use]
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Set max pages per entity
    #[must_use]
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Set how many entities sync at once
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Statistics from syncing one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Entity name
    pub stream: String,
    /// Pages fetched
    pub pages_fetched: usize,
    /// Records handed to the emitter
    pub records_emitted: usize,
    /// Records older than the starting point
    pub records_skipped: usize,
    /// Bookmark after the sync
    pub bookmark: Option<String>,
    /// Stopped early at the page limit
    pub truncated: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create empty stats for an entity
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Self::default()
        }
    }
}

/// An entity whose sync failed
#[derive(Debug)]
pub struct EntityFailure {
    /// Entity name
    pub stream: String,
    /// Why it failed
    pub error: Error,
}

/// Outcome of syncing several entities
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Entities that completed, in completion order
    pub completed: Vec<SyncStats>,
    /// Entities that failed
    pub failures: Vec<EntityFailure>,
}

impl SyncReport {
    /// Whether every entity completed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records emitted across all entities
    pub fn total_records(&self) -> usize {
        self.completed.iter().map(|s| s.records_emitted).sum()
    }

    /// Stats of one entity
    pub fn stats_for(&self, stream: &str) -> Option<&SyncStats> {
        self.completed.iter().find(|s| s.stream == stream)
    }
}
