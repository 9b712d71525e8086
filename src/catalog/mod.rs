//! Entity catalog module
//!
//! Entities are declared as data (YAML) instead of one type per entity.
//! Each `EntityDescriptor` carries the query text, the response key rule,
//! keys for incremental sync and an optional record hook.

mod builtin;
mod types;

pub use builtin::{Catalog, BUNNY_CATALOG_YAML};
pub use types::{camel_case, EntityDefinition, EntityDescriptor, PostProcess};
