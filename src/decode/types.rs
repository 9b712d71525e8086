//! Decoder types

use crate::pagination::PageInfo;
use crate::types::Record;

/// Where the items of a connection were found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    /// `nodes` array
    Nodes,
    /// `edges[*].node`
    Edges,
}

/// One decoded page, before post-processing
#[derive(Debug, Clone)]
pub struct DecodedPage {
    /// Non-null items in response order
    pub records: Vec<Record>,
    /// `pageInfo` of the connection, if reported
    pub page_info: Option<PageInfo>,
    /// Key under `data` that held the connection
    pub response_key: String,
    /// Shape the items were read from
    pub source: ItemSource,
    /// Null items dropped from the page
    pub null_items: usize,
}

impl DecodedPage {
    /// Number of items the server returned, nulls included
    pub fn item_count(&self) -> usize {
        self.records.len() + self.null_items
    }
}
