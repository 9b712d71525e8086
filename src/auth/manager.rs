//! Token manager implementation
//!
//! Owns the single OAuth2 bearer token shared by every entity sync and
//! refreshes it through the client-credentials exchange.

use super::types::{Credentials, ExpiryStrategy, Token, TokenManagerConfig};
use crate::config::{ConfigStore, TapConfig};
use crate::error::{excerpt, Error, Result};
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Shared owner of the OAuth2 access token
///
/// The token/expiry pair lives behind a single `RwLock`: readers never see a
/// half-written pair, and a refresh triggered by one caller is visible to
/// every other caller's next read.
pub struct TokenManager {
    credentials: Credentials,
    config: TokenManagerConfig,
    http_client: Client,
    token: RwLock<Option<Token>>,
    store: Option<Arc<dyn ConfigStore>>,
}

impl TokenManager {
    /// Create a token manager with default settings
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, TokenManagerConfig::default(), Client::new())
    }

    /// Create a token manager with custom settings and HTTP client
    pub fn with_client(
        credentials: Credentials,
        config: TokenManagerConfig,
        http_client: Client,
    ) -> Self {
        Self {
            credentials,
            config,
            http_client,
            token: RwLock::new(None),
            store: None,
        }
    }

    /// Build a token manager from tap configuration
    ///
    /// A token persisted by a previous run is reused while it is still valid.
    pub fn from_config(config: &TapConfig, http_client: Client) -> Result<Self> {
        let credentials = Credentials::new(
            &config.client_id,
            &config.client_secret,
            config.auth_url()?.to_string(),
        );
        let manager_config = TokenManagerConfig::default()
            .with_safety_margin(config.safety_margin())
            .with_expiry_strategy(config.expiry_strategy);

        let mut manager = Self::with_client(credentials, manager_config, http_client);
        if let (Some(value), Some(expires_at)) = (&config.access_token, config.token_expires_at) {
            manager = manager.with_token(Token::new(value.clone(), expires_at));
        }
        Ok(manager)
    }

    /// Seed the cache with an existing token
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = RwLock::new(Some(token));
        self
    }

    /// Persist every refreshed token through this store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get a valid token, refreshing if necessary
    pub async fn get_token(&self) -> Result<Token> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| self.usable(t)) {
                return Ok(token.clone());
            }
        }

        let mut cached = self.token.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|t| self.usable(t)) {
            return Ok(token.clone());
        }

        debug!("Access token missing or stale, refreshing");
        let token = self.exchange().await?;
        *cached = Some(token.clone());
        drop(cached);

        self.persist(&token).await;
        Ok(token)
    }

    /// Exchange credentials for a new token regardless of the cached one
    pub async fn force_refresh(&self) -> Result<Token> {
        let mut cached = self.token.write().await;

        info!("Forcing access token refresh");
        let token = self.exchange().await?;
        *cached = Some(token.clone());
        drop(cached);

        self.persist(&token).await;
        Ok(token)
    }

    /// Whether the cached token can be handed out without a refresh
    pub async fn is_valid(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(|t| self.usable(t))
    }

    /// Drop the cached token so the next read refreshes
    pub async fn clear_cache(&self) {
        *self.token.write().await = None;
    }

    /// Safety margin in effect
    pub fn safety_margin(&self) -> Duration {
        self.config.safety_margin
    }

    fn usable(&self, token: &Token) -> bool {
        token.is_usable(self.config.safety_margin)
    }

    /// Run the client-credentials exchange
    async fn exchange(&self) -> Result<Token> {
        let url = &self.credentials.token_url;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request to {url} failed: {e}")))?;

        let status = response.status();
        let received_at = Utc::now();
        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("Failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(Error::auth(format!(
                "Token request failed with status {}: {}",
                status.as_u16(),
                excerpt(&body)
            )));
        }

        let token = parse_token_response(&body, received_at, self.config.expiry_strategy)?;

        if !self.usable(&token) {
            return Err(Error::auth(format!(
                "Token lifetime of {}s is shorter than the {}s safety margin",
                token.remaining_seconds(),
                self.config.safety_margin.num_seconds()
            )));
        }

        info!(expires_at = %token.expires_at, "Obtained access token");
        Ok(token)
    }

    async fn persist(&self, token: &Token) {
        let Some(store) = &self.store else {
            return;
        };

        let mut fields = JsonObject::new();
        fields.insert("access_token".into(), JsonValue::from(token.value.clone()));
        fields.insert(
            "token_expires_at".into(),
            JsonValue::from(token.expires_at.to_rfc3339()),
        );

        if let Err(e) = store.update_config(fields).await {
            warn!("Failed to persist refreshed token: {e}");
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a token endpoint body into a [`Token`]
fn parse_token_response(
    body: &str,
    received_at: DateTime<Utc>,
    strategy: ExpiryStrategy,
) -> Result<Token> {
    let json: JsonValue = serde_json::from_str(body).map_err(|e| {
        Error::auth(format!(
            "Malformed token response: {e} (body: {})",
            excerpt(body)
        ))
    })?;

    let access_token = json
        .get("access_token")
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::auth("Token response is missing 'access_token'"))?;

    let expires_in = json
        .get("expires_in")
        .and_then(integer_field)
        .ok_or_else(|| Error::auth("Token response is missing 'expires_in'"))?;

    let issued_at = match strategy {
        ExpiryStrategy::LocalClock => received_at,
        ExpiryStrategy::ServerIssued => {
            let created_at = json.get("created_at").and_then(integer_field).ok_or_else(|| {
                Error::auth("Token response is missing 'created_at' required for server-issued expiry")
            })?;
            DateTime::<Utc>::from_timestamp(created_at, 0)
                .ok_or_else(|| Error::auth("Token response has out-of-range 'created_at'"))?
        }
    };

    let expires_at = Duration::try_seconds(expires_in)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| Error::auth("Token response has out-of-range 'expires_in'"))?;

    Ok(Token::new(access_token, expires_at))
}

/// Accept integers sent either as JSON numbers or numeric strings
fn integer_field(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
