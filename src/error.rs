//! Error types for tap-bunny
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The five extraction failure kinds (auth, transport, decode, schema,
//! GraphQL) are distinct variants so callers can decide per kind whether an
//! entity failure aborts the run.

use crate::graphql::GraphQlError;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters of a response body kept in an error
pub const BODY_EXCERPT_LIMIT: usize = 512;

/// The main error type for tap-bunny
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for entity '{entity}': {body}")]
    Transport {
        entity: String,
        status: u16,
        body: String,
    },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Failed to decode response for entity '{entity}': {message} (body: {excerpt})")]
    Decode {
        entity: String,
        message: String,
        excerpt: String,
    },

    #[error("Unexpected response shape for entity '{entity}': {message}")]
    Schema { entity: String, message: String },

    #[error(
        "GraphQL query for entity '{}' failed: {} (variables: {}, query: {})",
        .entity,
        join_errors(.errors),
        .variables,
        excerpt(.query)
    )]
    GraphQl {
        entity: String,
        errors: Vec<GraphQlError>,
        query: String,
        variables: Value,
    },

    // ============================================================================
    // State / Catalog Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Entity '{entity}' not found in catalog")]
    EntityNotFound { entity: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential exchange failed or a request was rejected twice with 401
    Auth,
    /// Non-success HTTP status or a failed connection
    Transport,
    /// Response body was not valid JSON
    Decode,
    /// Response JSON did not have the expected structure
    Schema,
    /// Well-formed response carrying GraphQL errors
    GraphQl,
    /// Everything else (config, state, I/O)
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a transport error, truncating the body
    pub fn transport(entity: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Transport {
            entity: entity.into(),
            status,
            body: excerpt(body),
        }
    }

    /// Create a decode error, truncating the body
    pub fn decode(entity: impl Into<String>, message: impl Into<String>, body: &str) -> Self {
        Self::Decode {
            entity: entity.into(),
            message: message.into(),
            excerpt: excerpt(body),
        }
    }

    /// Create a schema error
    pub fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Http(_) | Error::Transport { .. } => ErrorKind::Transport,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::GraphQl { .. } => ErrorKind::GraphQl,
            _ => ErrorKind::Other,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Truncate a response body to [`BODY_EXCERPT_LIMIT`] characters
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}... ({} bytes total)", &body[..idx], body.len()),
        None => body.to_string(),
    }
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for tap-bunny
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
