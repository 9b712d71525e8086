//! Entity descriptor types
//!
//! An entity is pure data: a name, the query that pages through it, and the
//! metadata the sync engine needs (keys, page size, variables).

use crate::graphql::normalize_query;
use crate::types::{JsonObject, JsonValue, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Record hook applied after decoding; returning `None` drops the record
pub type PostProcess = Arc<dyn Fn(Record) -> Option<Record> + Send + Sync>;

/// Serialized form of an entity in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Logical entity name (snake_case)
    pub name: String,

    /// Explicit key of the entity's node under `data`
    #[serde(default)]
    pub field: Option<String>,

    /// GraphQL query text
    pub query: String,

    /// Primary key fields
    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Field driving incremental sync
    #[serde(default)]
    pub replication_key: Option<String>,

    /// Expected number of items per full page
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Variables sent with every page
    #[serde(default)]
    pub variables: JsonObject,
}

/// A fetchable entity
#[derive(Clone)]
pub struct EntityDescriptor {
    /// Logical entity name (snake_case)
    pub name: String,
    /// Explicit key of the entity's node under `data`
    pub field: Option<String>,
    /// GraphQL query text as configured
    pub query: String,
    /// Primary key fields
    pub primary_keys: Vec<String>,
    /// Field driving incremental sync
    pub replication_key: Option<String>,
    /// Expected number of items per full page
    pub page_size: Option<u32>,
    /// Variables sent with every page
    pub variables: JsonObject,
    /// Record hook
    pub post_process: PostProcess,
}

impl EntityDescriptor {
    /// Create a descriptor with no keys, variables or hook
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            query: query.into(),
            primary_keys: Vec::new(),
            replication_key: None,
            page_size: None,
            variables: JsonObject::new(),
            post_process: Arc::new(keep_record),
        }
    }

    /// Set the explicit response key
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set primary keys
    #[must_use]
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Add a variable sent with every page
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set the record hook
    #[must_use]
    pub fn with_post_process<F>(mut self, hook: F) -> Self
    where
        F: Fn(Record) -> Option<Record> + Send + Sync + 'static,
    {
        self.post_process = Arc::new(hook);
        self
    }

    /// Query document as sent on the wire
    pub fn query_document(&self) -> String {
        normalize_query(&self.query)
    }

    /// Keys to try, in order, when locating the entity's node under `data`
    ///
    /// The explicit `field` (or the name itself) comes first; the camelCase
    /// form of the name is only a fallback.
    pub fn response_keys(&self) -> Vec<String> {
        let primary = self.field.clone().unwrap_or_else(|| self.name.clone());
        let derived = camel_case(&self.name);
        if derived == primary {
            vec![primary]
        } else {
            vec![primary, derived]
        }
    }

    /// Apply the record hook
    pub fn apply_post_process(&self, record: Record) -> Option<Record> {
        (self.post_process)(record)
    }
}

impl From<EntityDefinition> for EntityDescriptor {
    fn from(def: EntityDefinition) -> Self {
        Self {
            name: def.name,
            field: def.field,
            query: def.query,
            primary_keys: def.primary_keys,
            replication_key: def.replication_key,
            page_size: def.page_size,
            variables: def.variables,
            post_process: Arc::new(keep_record),
        }
    }
}

impl From<&EntityDescriptor> for EntityDefinition {
    fn from(entity: &EntityDescriptor) -> Self {
        Self {
            name: entity.name.clone(),
            field: entity.field.clone(),
            query: entity.query.clone(),
            primary_keys: entity.primary_keys.clone(),
            replication_key: entity.replication_key.clone(),
            page_size: entity.page_size,
            variables: entity.variables.clone(),
        }
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("primary_keys", &self.primary_keys)
            .field("replication_key", &self.replication_key)
            .field("page_size", &self.page_size)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

fn keep_record(record: Record) -> Option<Record> {
    Some(record)
}

/// snake_case to camelCase with a lowercase initial letter
///
/// `invoice_items` becomes `invoiceItems`. Empty segments from doubled or
/// leading underscores are skipped.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split('_').filter(|s| !s.is_empty()).enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
