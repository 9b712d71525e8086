//! Authentication module
//!
//! OAuth2 client-credentials flow for the Bunny API.
//!
//! The `TokenManager` is constructed once and shared (behind an `Arc`) by
//! every entity fetch. It hands out the cached token while it is outside the
//! safety margin, refreshes proactively otherwise, and exposes
//! `force_refresh` for callers that observed a 401.

mod manager;
mod types;

pub use manager::TokenManager;
pub use types::{
    Credentials, ExpiryStrategy, Token, TokenManagerConfig, DEFAULT_SAFETY_MARGIN_SECONDS,
    DEFAULT_SCOPE, MAX_SAFETY_MARGIN_SECONDS,
};
