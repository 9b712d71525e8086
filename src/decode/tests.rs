//! Tests for the response decoder

use super::*;
use crate::catalog::EntityDescriptor;
use crate::error::{Error, ErrorKind};
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn accounts() -> EntityDescriptor {
    EntityDescriptor::new("accounts", "accounts { nodes { id } pageInfo { hasNextPage endCursor } }")
}

fn decode(entity: &EntityDescriptor, body: serde_json::Value) -> crate::Result<DecodedPage> {
    decode_page(entity, &body.to_string(), &JsonObject::new())
}

fn ids(page: &DecodedPage) -> Vec<&str> {
    page.records
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect()
}

// ============================================================================
// Item Shapes
// ============================================================================

#[test]
fn test_nodes_shape() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {
            "nodes": [{"id": "1"}, {"id": "2"}],
            "pageInfo": {"hasNextPage": true, "endCursor": "cAAA"}
        }}}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["1", "2"]);
    assert_eq!(page.source, ItemSource::Nodes);
    assert_eq!(page.response_key, "accounts");
    let info = page.page_info.unwrap();
    assert_eq!(info.has_next_page, Some(true));
    assert_eq!(info.end_cursor.as_deref(), Some("cAAA"));
}

#[test]
fn test_edges_shape_keeps_order() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {
            "edges": [{"node": {"id": "a"}}, {"node": {"id": "b"}}],
            "pageInfo": {"hasNextPage": false}
        }}}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["a", "b"]);
    assert_eq!(page.source, ItemSource::Edges);
}

#[test]
fn test_nodes_preferred_over_edges() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {
            "nodes": [{"id": "n"}],
            "edges": [{"node": {"id": "e"}}]
        }}}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["n"]);
}

#[test]
fn test_null_items_dropped() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {"nodes": [{"id": "1"}, null, {"id": "3"}]}}}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["1", "3"]);
    assert_eq!(page.null_items, 1);
    assert_eq!(page.item_count(), 3);
}

#[test]
fn test_null_edges_and_nodes_dropped() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {"edges": [
            null,
            {"node": null},
            {"cursor": "x"},
            {"node": {"id": "4"}}
        ]}}}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["4"]);
    assert_eq!(page.null_items, 3);
}

#[test]
fn test_empty_page() {
    let page = decode(
        &accounts(),
        json!({"data": {"accounts": {"nodes": [], "pageInfo": {"hasNextPage": false}}}}),
    )
    .unwrap();

    assert!(page.records.is_empty());
    assert_eq!(page.page_info.unwrap().has_next_page, Some(false));
}

#[test]
fn test_missing_page_info() {
    let page = decode(&accounts(), json!({"data": {"accounts": {"nodes": []}}})).unwrap();
    assert!(page.page_info.is_none());
}

// ============================================================================
// Key Resolution
// ============================================================================

#[test]
fn test_camel_case_fallback() {
    let entity = EntityDescriptor::new("account_balances", "accountBalances { nodes { id } }");
    let page = decode(
        &entity,
        json!({"data": {"accountBalances": {"nodes": [{"id": "b1"}]}}}),
    )
    .unwrap();

    assert_eq!(page.response_key, "accountBalances");
    assert_eq!(ids(&page), vec!["b1"]);
}

#[test]
fn test_snake_case_key_wins() {
    let entity = EntityDescriptor::new("account_balances", "q");
    let page = decode(
        &entity,
        json!({"data": {
            "account_balances": {"nodes": [{"id": "snake"}]},
            "accountBalances": {"nodes": [{"id": "camel"}]}
        }}),
    )
    .unwrap();

    assert_eq!(ids(&page), vec!["snake"]);
}

#[test]
fn test_explicit_field_key() {
    let entity = EntityDescriptor::new("customers", "q").with_field("allAccounts");
    let page = decode(
        &entity,
        json!({"data": {"allAccounts": {"nodes": [{"id": "1"}]}}}),
    )
    .unwrap();

    assert_eq!(page.response_key, "allAccounts");
}

#[test]
fn test_unknown_key_is_schema_error() {
    let err = decode(&accounts(), json!({"data": {"contacts": {"nodes": []}}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    let message = err.to_string();
    assert!(message.contains("accounts"));
    assert!(message.contains("contacts"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_null_entity_data_is_schema_error() {
    let err = decode(&accounts(), json!({"data": {"accounts": null}})).unwrap_err();
    assert!(matches!(err, Error::Schema { ref entity, .. } if entity == "accounts"));
}

#[test_case(json!({"data": null}) ; "null data")]
#[test_case(json!({"extensions": {}}) ; "missing data")]
#[test_case(json!({"data": [1, 2]}) ; "array data")]
#[test_case(json!([{"data": {}}]) ; "array body")]
#[test_case(json!({"data": {"accounts": {"items": []}}}) ; "unknown connection shape")]
#[test_case(json!({"data": {"accounts": {"nodes": [1]}}}) ; "scalar node")]
#[test_case(json!({"data": {"accounts": {"edges": ["x"]}}}) ; "scalar edge")]
fn test_schema_errors(body: serde_json::Value) {
    let err = decode(&accounts(), body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_malformed_json_is_decode_error() {
    let err = decode_page(&accounts(), "<html>Bad Gateway</html>", &JsonObject::new()).unwrap_err();
    match err {
        Error::Decode { entity, excerpt, .. } => {
            assert_eq!(entity, "accounts");
            assert!(excerpt.contains("Bad Gateway"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_graphql_errors_reported() {
    let mut variables = JsonObject::new();
    variables.insert("after".into(), json!("cAAA"));

    let body = json!({
        "errors": [{"message": "boom", "path": ["accounts", 3, "name"]}],
        "data": {"accounts": {"nodes": [{"id": "1"}]}}
    });
    let err = decode_page(&accounts(), &body.to_string(), &variables).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("boom"));
    assert!(message.contains("accounts.3.name"));
    assert!(message.contains("cAAA"));
    assert!(message.contains(&accounts().query_document()));

    match err {
        Error::GraphQl { errors, query, variables, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].joined_path().as_deref(), Some("accounts.3.name"));
            assert!(query.starts_with("query"));
            assert_eq!(variables, json!({"after": "cAAA"}));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test_case(json!([]) ; "empty array")]
#[test_case(json!(null) ; "null")]
fn test_empty_errors_ignored(errors: serde_json::Value) {
    let page = decode(
        &accounts(),
        json!({"errors": errors, "data": {"accounts": {"nodes": [{"id": "1"}]}}}),
    )
    .unwrap();
    assert_eq!(ids(&page), vec!["1"]);
}
