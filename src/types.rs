//! Common types used throughout tap-bunny
//!
//! Shared type aliases for the JSON values flowing between the fetcher,
//! the entity catalog and the sync engine.

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One extracted entity instance
pub type Record = JsonObject;
