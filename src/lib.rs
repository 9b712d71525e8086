// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-bunny
//!
//! Extracts entities from the Bunny subscription-billing GraphQL API.
//!
//! ## Features
//!
//! - **OAuth2 client credentials**: one shared token, refreshed ahead of
//!   expiry and after a 401
//! - **Relay pagination**: `pageInfo.hasNextPage` / `endCursor`, items under
//!   `nodes` or `edges[*].node`
//! - **Entity catalog**: entities are YAML data, not code
//! - **Incremental sync**: per-entity bookmarks on the replication key
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tap_bunny::{Catalog, PagingFetcher, TapConfig, TokenManager};
//!
//! #[tokio::main]
//! async fn main() -> tap_bunny::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let client = tap_bunny::fetch::http_client(&config)?;
//!     let tokens = Arc::new(TokenManager::from_config(&config, client)?);
//!     let fetcher = PagingFetcher::from_config(&config, tokens)?;
//!
//!     let catalog = Catalog::bunny()?;
//!     let accounts = catalog.get("accounts").unwrap();
//!     let page = fetcher.fetch_page(accounts, None, &Default::default()).await?;
//!     println!("{} records, more: {}", page.records.len(), page.has_next());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SyncEngine: entity loop, bookmarks, RECORD/STATE        │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//! ┌────────────────────────────┴─────────────────────────────┐
//! │  PagingFetcher: request, 401 retry, next cursor          │
//! └───────┬──────────────┬──────────────┬────────────────────┘
//!         │              │              │
//! ┌───────┴──────┐ ┌─────┴──────┐ ┌─────┴──────┐
//! │ TokenManager │ │  decode    │ │ pagination │
//! │ OAuth2 token │ │  response  │ │ PageInfo   │
//! └──────────────┘ └────────────┘ └────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// GraphQL wire types
pub mod graphql;

/// OAuth2 token management
pub mod auth;

/// Tap configuration and persistence
pub mod config;

/// Entity catalog
pub mod catalog;

/// Cursor pagination
pub mod pagination;

/// GraphQL response decoding
pub mod decode;

/// Page fetching
pub mod fetch;

/// Bookmarks
pub mod state;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

pub use auth::{Token, TokenManager};
pub use catalog::{Catalog, EntityDescriptor};
pub use config::TapConfig;
pub use engine::{Message, SyncEngine};
pub use fetch::{Page, PagingFetcher};
pub use pagination::PageCursor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
