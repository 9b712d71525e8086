//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::State;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// State manager for persisting and loading bookmarks
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file; empty in memory mode
    path: PathBuf,
    state: Arc<RwLock<State>>,
    /// Serializes writes of the state file across clones
    save_lock: Arc<Mutex<()>>,
    /// Save after every bookmark update
    auto_save: bool,
}

impl StateManager {
    /// Create a file-backed manager starting from empty state
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
            save_lock: Arc::new(Mutex::new(())),
            auto_save: true,
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Create an in-memory state manager seeded with `state`
    pub fn with_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
            save_lock: Arc::new(Mutex::new(())),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            save_lock: Arc::new(Mutex::new(())),
            auto_save: true,
        })
    }

    /// Create an in-memory state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(parse_state(json)?))
    }

    /// Disable saving after every bookmark update
    #[must_use]
    pub fn without_auto_save(mut self) -> Self {
        self.auto_save = false;
        self
    }

    /// Save current state to file
    ///
    /// Writes a sibling temp file and renames it over the target, so a crash
    /// never leaves a truncated state file behind. Saves from all clones are
    /// serialized and each serializes the state while holding the lock.
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let _guard = self.save_lock.lock().await;
        let contents = self.to_json_pretty().await?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), "Saved state");
        Ok(())
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Bookmarked replication value of an entity
    pub async fn get_bookmark(&self, stream: &str) -> Option<String> {
        let state = self.state.read().await;
        state.get_bookmark(stream).map(ToString::to_string)
    }

    /// Record the replication value reached for an entity
    pub async fn set_bookmark(&self, stream: &str, key: &str, value: impl Into<String>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set_bookmark(stream, key, value);
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse_state(json: &str) -> Result<State> {
    if json.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
