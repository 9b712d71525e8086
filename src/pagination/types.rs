//! Pagination types
//!
//! Relay-style cursor pagination: every page reports `pageInfo` with
//! `hasNextPage` and `endCursor`, and the next request passes that cursor as
//! `$after`.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque position after the last item of a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a cursor string
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    /// The raw cursor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageCursor {
    fn from(cursor: &str) -> Self {
        Self::new(cursor)
    }
}

impl From<String> for PageCursor {
    fn from(cursor: String) -> Self {
        Self(cursor)
    }
}

/// `pageInfo` of a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// `hasNextPage`, when reported as a boolean
    pub has_next_page: Option<bool>,
    /// `endCursor`, when reported as a non-empty string
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// Read `pageInfo` from a connection node
    ///
    /// Returns `None` when the node has no `pageInfo` object.
    pub fn from_node(node: &JsonObject) -> Option<Self> {
        let info = node.get("pageInfo")?.as_object()?;
        Some(Self {
            has_next_page: info.get("hasNextPage").and_then(JsonValue::as_bool),
            end_cursor: info
                .get("endCursor")
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
    }
}

/// How the next cursor is derived from a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationPolicy {
    /// Keep paginating when `hasNextPage` is missing but the page is full
    ///
    /// Compensates for servers that omit the flag. Off unless a deployment
    /// is known to need it.
    pub full_page_heuristic: bool,
}

impl PaginationPolicy {
    /// Policy trusting only `hasNextPage`
    pub fn strict() -> Self {
        Self::default()
    }

    /// Policy with the full-page heuristic enabled
    pub fn with_full_page_heuristic() -> Self {
        Self {
            full_page_heuristic: true,
        }
    }

    /// Decide the cursor for the next page
    ///
    /// No `pageInfo` and `hasNextPage: false` both end pagination. A page
    /// claiming more results without an `endCursor` is a schema error, since
    /// continuing would refetch the first page.
    pub fn next_cursor(
        &self,
        entity: &str,
        page_info: Option<&PageInfo>,
        item_count: usize,
        page_size: Option<u32>,
    ) -> Result<Option<PageCursor>> {
        let Some(info) = page_info else {
            return Ok(None);
        };

        match info.has_next_page {
            Some(false) => Ok(None),
            Some(true) => match &info.end_cursor {
                Some(cursor) => Ok(Some(PageCursor::new(cursor.clone()))),
                None => Err(Error::schema(
                    entity,
                    "pageInfo.hasNextPage is true but endCursor is missing",
                )),
            },
            None => {
                let full_page =
                    item_count > 0 && page_size.is_some_and(|size| size as usize == item_count);
                if self.full_page_heuristic && full_page {
                    Ok(info.end_cursor.clone().map(PageCursor::new))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
