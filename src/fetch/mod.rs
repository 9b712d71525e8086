//! Paging fetcher module
//!
//! # Overview
//!
//! `PagingFetcher` issues one authenticated GraphQL request per page and
//! turns the response into records plus the cursor of the next page. The
//! only retry it performs is a single resend after a 401, with a freshly
//! exchanged token.

mod fetcher;

pub use fetcher::{http_client, Page, PagingFetcher, DEFAULT_USER_AGENT};
