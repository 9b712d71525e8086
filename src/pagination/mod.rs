//! Pagination module
//!
//! Cursor pagination over GraphQL connections.
//!
//! # Overview
//!
//! `PageInfo` is read from each decoded page and `PaginationPolicy` turns it
//! into the `PageCursor` for the next request, or `None` when the entity is
//! exhausted.

mod types;

pub use types::{PageCursor, PageInfo, PaginationPolicy};
