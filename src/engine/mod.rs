//! Execution engine module
//!
//! Main read loop and entity orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Walks every page of an entity and maintains bookmarks
//! - `SyncConfig` - Incremental, page limit and concurrency settings
//! - `Message` - Singer-style RECORD and STATE messages

mod replication;
mod types;

pub use replication::{compare_values, replication_value, starting_point};
pub use types::{EntityFailure, Message, SyncConfig, SyncReport, SyncStats};

use crate::catalog::EntityDescriptor;
use crate::error::{Error, Result};
use crate::fetch::PagingFetcher;
use crate::pagination::PageCursor;
use crate::state::StateManager;
use crate::types::JsonObject;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{error, info, warn};

/// Receives messages as pages arrive
pub type Emit<'a> = &'a (dyn Fn(Message) + Send + Sync);

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    fetcher: PagingFetcher,
    state: StateManager,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(fetcher: PagingFetcher, state: StateManager) -> Self {
        Self {
            fetcher,
            state,
            config: SyncConfig::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get the fetcher
    pub fn fetcher(&self) -> &PagingFetcher {
        &self.fetcher
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sync every page of one entity
    ///
    /// Records are emitted page by page, so a failure part-way leaves the
    /// earlier pages delivered. The bookmark only moves once the walk
    /// reaches the last page.
    pub async fn sync_entity(&self, entity: &EntityDescriptor, emit: Emit<'_>) -> Result<SyncStats> {
        let started = Instant::now();
        let name = entity.name.as_str();
        let mut stats = SyncStats::new(name);

        let replication_key = entity.replication_key.as_deref();
        let previous = self.state.get_bookmark(name).await;
        let start_from = match replication_key {
            Some(_) if self.config.incremental => {
                starting_point(previous.as_deref(), self.config.start_date)
            }
            _ => None,
        };

        info!(
            entity = name,
            start_from = start_from.as_deref().unwrap_or("-"),
            "Starting sync"
        );

        let no_overrides = JsonObject::new();
        let mut cursor: Option<PageCursor> = None;
        let mut max_seen: Option<String> = None;

        loop {
            let page = self
                .fetcher
                .fetch_page(entity, cursor.as_ref(), &no_overrides)
                .await?;
            let extracted_at = Utc::now();
            stats.pages_fetched += 1;

            for record in page.records {
                if let Some(value) = replication_key.and_then(|key| replication_value(&record, key)) {
                    if start_from
                        .as_deref()
                        .is_some_and(|start| compare_values(&value, start) == Ordering::Less)
                    {
                        stats.records_skipped += 1;
                        continue;
                    }
                    if max_seen
                        .as_deref()
                        .map_or(true, |max| compare_values(&value, max) == Ordering::Greater)
                    {
                        max_seen = Some(value);
                    }
                }
                emit(Message::record(name, record, extracted_at));
                stats.records_emitted += 1;
            }

            let Some(next) = page.next_cursor else {
                break;
            };
            if cursor.as_ref() == Some(&next) {
                return Err(Error::schema(
                    name,
                    format!("endCursor '{next}' did not advance"),
                ));
            }
            if self
                .config
                .max_pages
                .is_some_and(|max| stats.pages_fetched >= max)
            {
                warn!(entity = name, pages = stats.pages_fetched, "Reached page limit");
                stats.truncated = true;
                break;
            }
            cursor = Some(next);
        }

        stats.bookmark = previous;
        if let (Some(key), Some(value), false) = (replication_key, max_seen, stats.truncated) {
            let advances = stats
                .bookmark
                .as_deref()
                .map_or(true, |current| compare_values(&value, current) == Ordering::Greater);
            if advances {
                self.state.set_bookmark(name, key, value.clone()).await?;
                stats.bookmark = Some(value);
            }
            emit(Message::state(serde_json::to_value(
                self.state.snapshot().await,
            )?));
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            stats.duration_ms = started.elapsed().as_millis() as u64;
        }

        info!(
            entity = name,
            pages = stats.pages_fetched,
            records = stats.records_emitted,
            skipped = stats.records_skipped,
            "Completed sync"
        );

        Ok(stats)
    }

    /// Sync several entities, up to `concurrency` at a time
    ///
    /// With `fail_fast` off a failed entity is recorded and the rest carry
    /// on; with it on the first failure cancels the entities still running.
    pub async fn sync_all(&self, entities: &[EntityDescriptor], emit: Emit<'_>) -> Result<SyncReport> {
        let mut results = stream::iter(entities)
            .map(|entity| async move { (entity.name.clone(), self.sync_entity(entity, emit).await) })
            .buffer_unordered(self.config.concurrency.max(1));

        let mut report = SyncReport::default();
        while let Some((stream, result)) = results.next().await {
            match result {
                Ok(stats) => report.completed.push(stats),
                Err(e) => {
                    error!(entity = %stream, error = %e, "Entity sync failed");
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    report.failures.push(EntityFailure { stream, error: e });
                }
            }
        }

        Ok(report)
    }
}
