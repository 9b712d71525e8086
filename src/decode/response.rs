//! GraphQL response decoding
//!
//! Turns a response body into the records of one entity page, tolerating
//! the shapes the API is known to return: items under `nodes` or under
//! `edges[*].node`, connection keys in snake_case or camelCase, and sparse
//! item lists.

use super::types::{DecodedPage, ItemSource};
use crate::catalog::EntityDescriptor;
use crate::error::{Error, Result};
use crate::graphql::GraphQlError;
use crate::pagination::PageInfo;
use crate::types::{JsonObject, JsonValue, Record};
use tracing::debug;

/// Decode a response body for `entity`
///
/// `variables` are only used to describe the request in GraphQL errors.
pub fn decode_page(
    entity: &EntityDescriptor,
    body: &str,
    variables: &JsonObject,
) -> Result<DecodedPage> {
    let name = entity.name.as_str();

    let value: JsonValue = serde_json::from_str(body)
        .map_err(|e| Error::decode(name, format!("Failed to parse JSON: {e}"), body))?;

    let root = match value {
        JsonValue::Object(root) => root,
        other => {
            return Err(Error::schema(
                name,
                format!("response is a JSON {}, not an object", json_type(&other)),
            ))
        }
    };

    if let Some(errors) = root.get("errors").filter(|e| has_errors(e)) {
        return Err(Error::GraphQl {
            entity: name.to_string(),
            errors: GraphQlError::parse_all(errors),
            query: entity.query_document(),
            variables: JsonValue::Object(variables.clone()),
        });
    }

    let data = match root.get("data") {
        Some(JsonValue::Object(data)) => data,
        Some(JsonValue::Null) => return Err(Error::schema(name, "response 'data' is null")),
        Some(other) => {
            return Err(Error::schema(
                name,
                format!("response 'data' is a JSON {}", json_type(other)),
            ))
        }
        None => {
            return Err(Error::schema(
                name,
                format!(
                    "response has no 'data' (top-level keys: [{}])",
                    join_keys(&root)
                ),
            ))
        }
    };

    let keys = entity.response_keys();
    let Some((key, node)) = keys
        .iter()
        .find_map(|k| data.get(k.as_str()).map(|v| (k.clone(), v)))
    else {
        return Err(Error::schema(
            name,
            format!(
                "none of [{}] found in data (present keys: [{}])",
                keys.join(", "),
                join_keys(data)
            ),
        ));
    };

    if keys.first() != Some(&key) {
        debug!(entity = name, key = %key, "Resolved entity data via derived key");
    }

    let node = match node {
        JsonValue::Object(node) => node,
        JsonValue::Null => {
            return Err(Error::schema(
                name,
                format!("data for entity is null (key '{key}')"),
            ))
        }
        other => {
            return Err(Error::schema(
                name,
                format!("data for entity is a JSON {} (key '{key}')", json_type(other)),
            ))
        }
    };

    let (source, items) = if let Some(JsonValue::Array(nodes)) = node.get("nodes") {
        (ItemSource::Nodes, collect_nodes(name, nodes)?)
    } else if let Some(JsonValue::Array(edges)) = node.get("edges") {
        (ItemSource::Edges, collect_edges(name, edges)?)
    } else {
        return Err(Error::schema(
            name,
            format!(
                "neither 'nodes' nor 'edges' array under '{key}' (present keys: [{}])",
                join_keys(node)
            ),
        ));
    };

    let (records, null_items) = items;
    if null_items > 0 {
        debug!(entity = name, null_items, "Dropped null items from page");
    }

    Ok(DecodedPage {
        records,
        page_info: PageInfo::from_node(node),
        response_key: key,
        source,
        null_items,
    })
}

fn collect_nodes(entity: &str, nodes: &[JsonValue]) -> Result<(Vec<Record>, usize)> {
    let mut records = Vec::with_capacity(nodes.len());
    let mut nulls = 0;
    for (idx, item) in nodes.iter().enumerate() {
        match item {
            JsonValue::Null => nulls += 1,
            JsonValue::Object(record) => records.push(record.clone()),
            other => {
                return Err(Error::schema(
                    entity,
                    format!("nodes[{idx}] is a JSON {}", json_type(other)),
                ))
            }
        }
    }
    Ok((records, nulls))
}

fn collect_edges(entity: &str, edges: &[JsonValue]) -> Result<(Vec<Record>, usize)> {
    let mut records = Vec::with_capacity(edges.len());
    let mut nulls = 0;
    for (idx, edge) in edges.iter().enumerate() {
        let node = match edge {
            JsonValue::Null => None,
            JsonValue::Object(edge) => edge.get("node"),
            other => {
                return Err(Error::schema(
                    entity,
                    format!("edges[{idx}] is a JSON {}", json_type(other)),
                ))
            }
        };
        match node {
            None | Some(JsonValue::Null) => nulls += 1,
            Some(JsonValue::Object(record)) => records.push(record.clone()),
            Some(other) => {
                return Err(Error::schema(
                    entity,
                    format!("edges[{idx}].node is a JSON {}", json_type(other)),
                ))
            }
        }
    }
    Ok((records, nulls))
}

/// `errors` counts when it is a non-empty array or any other non-null value
fn has_errors(errors: &JsonValue) -> bool {
    match errors {
        JsonValue::Null => false,
        JsonValue::Array(entries) => !entries.is_empty(),
        _ => true,
    }
}

fn join_keys(map: &JsonObject) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
