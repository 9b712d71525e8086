//! Tap configuration
//!
//! The configuration is a flat JSON object (the same shape Singer taps
//! use). Besides credentials and endpoints it carries the token persisted by
//! the last refresh, which `FileConfigStore` writes back into the file.

use crate::auth::{ExpiryStrategy, DEFAULT_SAFETY_MARGIN_SECONDS, MAX_SAFETY_MARGIN_SECONDS};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use url::Url;

// ============================================================================
// Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth2 client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: String,

    /// Base URL of the Bunny instance
    #[serde(default)]
    pub api_url: String,

    /// Token endpoint path, relative to `api_url`
    #[serde(default = "default_auth_path")]
    pub auth_path: String,

    /// GraphQL endpoint path, relative to `api_url`
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// Custom User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Earliest replication value to sync
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Honour bookmarks and `start_date`; false forces a full walk
    #[serde(default = "default_true")]
    pub incremental_sync: bool,

    /// HTTP timeout for every request
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Seconds before expiry at which the token is refreshed
    #[serde(default = "default_safety_margin")]
    pub token_safety_margin_seconds: i64,

    /// Source of the token issuance time
    #[serde(default)]
    pub expiry_strategy: ExpiryStrategy,

    /// Keep paginating when a page is full but `hasNextPage` is missing
    #[serde(default)]
    pub full_page_heuristic: bool,

    /// Token persisted by the last refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Expiry of the persisted token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
}

fn default_auth_path() -> String {
    "/oauth/token".to_string()
}

fn default_graphql_path() -> String {
    "/graphql".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_safety_margin() -> i64 {
    DEFAULT_SAFETY_MARGIN_SECONDS
}

impl TapConfig {
    /// Parse and validate config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Check required fields and derived URLs
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("api_url", &self.api_url),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }
        if !(0..=MAX_SAFETY_MARGIN_SECONDS).contains(&self.token_safety_margin_seconds) {
            return Err(Error::config(format!(
                "token_safety_margin_seconds must be between 0 and {MAX_SAFETY_MARGIN_SECONDS}, got {}",
                self.token_safety_margin_seconds
            )));
        }
        self.auth_url()?;
        self.graphql_url()?;
        Ok(())
    }

    /// Token endpoint URL
    pub fn auth_url(&self) -> Result<Url> {
        join_url(&self.api_url, &self.auth_path)
    }

    /// GraphQL endpoint URL
    pub fn graphql_url(&self) -> Result<Url> {
        join_url(&self.api_url, &self.graphql_path)
    }

    /// Token safety margin
    ///
    /// Clamped to the validated range for configs built without `validate`.
    pub fn safety_margin(&self) -> chrono::Duration {
        let seconds = self
            .token_safety_margin_seconds
            .clamp(0, MAX_SAFETY_MARGIN_SECONDS);
        chrono::Duration::seconds(seconds)
    }

    /// HTTP timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("auth_path", &self.auth_path)
            .field("graphql_path", &self.graphql_path)
            .field("user_agent", &self.user_agent)
            .field("start_date", &self.start_date)
            .field("incremental_sync", &self.incremental_sync)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("expiry_strategy", &self.expiry_strategy)
            .field("full_page_heuristic", &self.full_page_heuristic)
            .field("has_access_token", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Join a base URL and a path, tolerating slashes on either side
fn join_url(base: &str, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(Url::parse(path)?);
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

// ============================================================================
// Config Persistence
// ============================================================================

/// Sink for config fields that must survive a restart
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Merge `fields` into the persisted configuration
    async fn update_config(&self, fields: JsonObject) -> Result<()>;
}

/// Writes updates back into the JSON config file
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    /// Create a store for the given file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn update_config(&self, fields: JsonObject) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut current = if self.path.exists() {
            let contents = tokio::fs::read_to_string(&self.path).await?;
            match serde_json::from_str::<JsonValue>(&contents)? {
                JsonValue::Object(map) => map,
                _ => {
                    return Err(Error::config(format!(
                        "Config file {} is not a JSON object",
                        self.path.display()
                    )))
                }
            }
        } else {
            JsonObject::new()
        };

        current.extend(fields);
        let contents = serde_json::to_string_pretty(&current)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

/// Keeps updates in memory
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<JsonObject>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub async fn snapshot(&self) -> JsonObject {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn update_config(&self, fields: JsonObject) -> Result<()> {
        self.values.write().await.extend(fields);
        Ok(())
    }
}
