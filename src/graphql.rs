//! GraphQL-over-HTTP wire types
//!
//! Request payload `{query, variables}` and the error entries found in a
//! response's top-level `errors` array.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body sent to the GraphQL endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    /// Query document
    pub query: &'a str,
    /// Query variables
    pub variables: &'a JsonObject,
}

/// Location of an error in the query document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlLocation {
    pub line: u64,
    pub column: u64,
}

/// One segment of an error path: a field name or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(u64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// One entry of a response's `errors` array
///
/// Servers are inconsistent about which members they populate, so every
/// member except `message` is optional and unknown members are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default)]
    pub locations: Option<Vec<GraphQlLocation>>,
    #[serde(default)]
    pub extensions: Option<JsonValue>,
}

impl GraphQlError {
    /// Path joined with dots, e.g. `accounts.3.name`
    pub fn joined_path(&self) -> Option<String> {
        self.path.as_ref().map(|segments| {
            segments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        })
    }

    /// Parse an `errors` array, keeping entries that do not match the
    /// expected shape as their raw JSON text
    pub fn parse_all(errors: &JsonValue) -> Vec<GraphQlError> {
        let Some(entries) = errors.as_array() else {
            return vec![GraphQlError::from_raw(errors)];
        };

        entries
            .iter()
            .map(|entry| {
                serde_json::from_value(entry.clone()).unwrap_or_else(|_| Self::from_raw(entry))
            })
            .collect()
    }

    fn from_raw(value: &JsonValue) -> Self {
        Self {
            message: value.to_string(),
            path: None,
            locations: None,
            extensions: None,
        }
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(path) = self.joined_path() {
            write!(f, " [path: {path}]")?;
        }
        if let Some(locations) = self.locations.as_ref().filter(|l| !l.is_empty()) {
            let joined = locations
                .iter()
                .map(|l| format!("{}:{}", l.line, l.column))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " [locations: {joined}]")?;
        }
        if let Some(extensions) = &self.extensions {
            write!(f, " [extensions: {extensions}]")?;
        }
        Ok(())
    }
}

/// Wrap a bare selection set into a full query document
///
/// Catalog queries may be written as just the connection selection
/// (`accounts(first: 100, after: $after) { ... }`). Those are wrapped in an
/// operation declaring `$after`. Text that already starts an operation is
/// returned as is.
pub fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.starts_with("query") || trimmed.starts_with("mutation") || trimmed.starts_with('{')
    {
        trimmed.to_string()
    } else {
        format!("query ($after: String) {{ {trimmed} }}")
    }
}
