//! Response decoder module
//!
//! # Overview
//!
//! `decode_page` parses one GraphQL response body and returns the entity's
//! records together with its `pageInfo`. GraphQL errors, missing or null
//! data and unknown connection shapes surface as distinct errors.

mod response;
mod types;

pub use response::decode_page;
pub use types::{DecodedPage, ItemSource};

#[cfg(test)]
mod tests;
