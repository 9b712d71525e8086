//! Auth types
//!
//! Credentials, the cached bearer token and the knobs controlling how its
//! expiry is computed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope requested by the client-credentials exchange
pub const DEFAULT_SCOPE: &str =
    "standard:read standard:write product:read product:write billing:read billing:write";

/// Default time before expiry at which a token is considered stale
pub const DEFAULT_SAFETY_MARGIN_SECONDS: i64 = 300;

/// Largest accepted safety margin (one day)
pub const MAX_SAFETY_MARGIN_SECONDS: i64 = 86_400;

/// OAuth2 client credentials
#[derive(Clone)]
pub struct Credentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Where the issuance time used for expiry math comes from
///
/// A deployment picks one; mixing them produces inconsistent expiries when
/// the server clock and the local clock disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStrategy {
    /// Local clock at the moment the token response is received
    #[default]
    LocalClock,
    /// `created_at` (unix seconds) reported in the token response
    ServerIssued,
}

/// Token manager settings
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    /// Tokens within this much of their expiry are refreshed before use
    pub safety_margin: Duration,
    /// Requested scope
    pub scope: String,
    /// How expiry is computed
    pub expiry_strategy: ExpiryStrategy,
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECONDS),
            scope: DEFAULT_SCOPE.to_string(),
            expiry_strategy: ExpiryStrategy::LocalClock,
        }
    }
}

impl TokenManagerConfig {
    /// Set the safety margin
    #[must_use]
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Set the requested scope
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the expiry strategy
    #[must_use]
    pub fn with_expiry_strategy(mut self, strategy: ExpiryStrategy) -> Self {
        self.expiry_strategy = strategy;
        self
    }
}

/// Bearer token with its absolute expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The access token
    pub value: String,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Create a new token
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(value: impl Into<String>, seconds: i64) -> Self {
        Self::new(value, Utc::now() + Duration::seconds(seconds))
    }

    /// Check if the token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the token can still be handed out given a safety margin
    ///
    /// A margin that overflows the clock leaves the token unusable.
    pub fn is_usable(&self, margin: Duration) -> bool {
        Utc::now()
            .checked_add_signed(margin)
            .is_some_and(|deadline| deadline < self.expires_at)
    }

    /// Seconds left until expiry (negative once expired)
    pub fn remaining_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_token_not_expired() {
        let token = Token::expires_in("test", 3600);
        assert!(!token.is_expired());
        assert!(token.is_usable(Duration::seconds(300)));
    }

    #[test]
    fn test_token_expired() {
        let token = Token::expires_in("test", -100);
        assert!(token.is_expired());
        assert!(!token.is_usable(Duration::zero()));
    }

    #[test]
    fn test_token_within_margin() {
        let token = Token::expires_in("test", 120);
        assert!(!token.is_expired());
        assert!(!token.is_usable(Duration::seconds(300)));
        assert!(token.is_usable(Duration::seconds(30)));
    }

    #[test]
    fn test_overflowing_margin_is_unusable() {
        let token = Token::expires_in("test", 3600);
        assert!(!token.is_usable(Duration::MAX));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = Token::expires_in("super-secret-token", 60);
        assert!(!format!("{token:?}").contains("super-secret-token"));

        let creds = Credentials::new("id", "hunter2", "https://example.com/oauth/token");
        let text = format!("{creds:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("https://example.com/oauth/token"));
    }

    #[test]
    fn test_config_defaults() {
        let config = TokenManagerConfig::default();
        assert_eq!(config.safety_margin, Duration::minutes(5));
        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert_eq!(config.expiry_strategy, ExpiryStrategy::LocalClock);
    }

    #[test]
    fn test_expiry_strategy_serde() {
        let s: ExpiryStrategy = serde_json::from_str("\"server_issued\"").unwrap();
        assert_eq!(s, ExpiryStrategy::ServerIssued);
    }
}
