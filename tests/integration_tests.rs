//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → token exchange → GraphQL pages →
//! RECORD/STATE messages

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tap_bunny::config::FileConfigStore;
use tap_bunny::engine::SyncConfig;
use tap_bunny::fetch::http_client;
use tap_bunny::state::StateManager;
use tap_bunny::types::JsonObject;
use tap_bunny::{
    Catalog, Error, ErrorKind, Message, PageCursor, PagingFetcher, SyncEngine, TapConfig,
    TokenManager,
};
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches GraphQL requests sent without an `after` variable
struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<serde_json::Value>(&request.body)
            .ok()
            .is_some_and(|body| body["variables"].get("after").is_none())
    }
}

fn config_for(server: &MockServer) -> TapConfig {
    TapConfig::from_json(
        &json!({
            "client_id": "client",
            "client_secret": "secret",
            "api_url": server.uri(),
        })
        .to_string(),
    )
    .unwrap()
}

fn fetcher_for(config: &TapConfig) -> PagingFetcher {
    let tokens = TokenManager::from_config(config, http_client(config).unwrap()).unwrap();
    PagingFetcher::from_config(config, Arc::new(tokens)).unwrap()
}

/// Mount the token endpoint; returns the reported `created_at`
async fn mount_token(server: &MockServer, token: &str, times: u64) -> i64 {
    let created_at = chrono::Utc::now().timestamp();
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 7200,
            "created_at": created_at
        })))
        .expect(times)
        .mount(server)
        .await;
    created_at
}

fn account_edges(range: std::ops::Range<usize>) -> Vec<serde_json::Value> {
    range
        .map(|i| json!({"node": {"id": format!("acc-{i}"), "name": format!("Account {i}")}}))
        .collect()
}

// ============================================================================
// End-to-end Pagination
// ============================================================================

#[tokio::test]
async fn test_two_page_walk_over_builtin_catalog() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer tok-1"))
        .and(FirstPage)
        .and(body_partial_json(json!({"variables": {"first": 100}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"accounts": {
            "edges": account_edges(0..100),
            "pageInfo": {"hasNextPage": true, "endCursor": "cAAA"}
        }}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"first": 100, "after": "cAAA"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"accounts": {
            "edges": account_edges(100..142),
            "pageInfo": {"hasNextPage": false, "endCursor": "cBBB"}
        }}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let catalog = Catalog::bunny().unwrap();
    let entities = catalog.select(&["accounts"]).unwrap();

    let engine = SyncEngine::new(fetcher_for(&config), StateManager::in_memory())
        .with_config(SyncConfig::from_tap_config(&config));
    let messages = Mutex::new(Vec::new());
    let emit = |m: Message| messages.lock().unwrap().push(m);

    let report = engine.sync_all(&entities, &emit).await.unwrap();

    assert!(report.is_success());
    let stats = report.stats_for("accounts").unwrap();
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.records_emitted, 142);

    let messages = messages.into_inner().unwrap();
    let ids: Vec<String> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => Some(record["id"].as_str().unwrap().to_string()),
            Message::State { .. } => None,
        })
        .collect();
    let expected: Vec<String> = (0..142).map(|i| format!("acc-{i}")).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_fetch_page_cursor_threading() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"invoices": {
            "nodes": [{"id": "inv-1"}, null, {"id": "inv-2"}],
            "pageInfo": {"hasNextPage": false, "endCursor": "cZZZ"}
        }}})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let catalog = Catalog::bunny().unwrap();
    let invoices = catalog.get("invoices").unwrap();

    let page = fetcher_for(&config)
        .fetch_page(invoices, Some(&PageCursor::from("cYYY")), &JsonObject::new())
        .await
        .unwrap();

    assert_eq!(page.records.len(), 2);
    assert!(page.next_cursor.is_none());
}

// ============================================================================
// Token Lifecycle
// ============================================================================

#[tokio::test]
async fn test_unauthorized_page_retried_with_fresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "fresh", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"plans": {
            "nodes": [{"id": "plan-1"}],
            "pageInfo": {"hasNextPage": false}
        }}})))
        .expect(1)
        .mount(&server)
        .await;

    // A token persisted by an earlier run, still inside its lifetime
    let mut config = config_for(&server);
    config.access_token = Some("revoked".to_string());
    config.token_expires_at = Some(chrono::Utc::now() + chrono::Duration::hours(2));

    let catalog = Catalog::bunny().unwrap();
    let page = fetcher_for(&config)
        .fetch_page(catalog.get("plans").unwrap(), None, &JsonObject::new())
        .await
        .unwrap();

    assert_eq!(page.records.len(), 1);
}

#[tokio::test]
async fn test_refreshed_token_written_to_config_file() {
    let server = MockServer::start().await;
    let created_at = mount_token(&server, "tok-persisted", 1).await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        json!({
            "client_id": "client",
            "client_secret": "secret",
            "api_url": server.uri(),
            "expiry_strategy": "server_issued"
        })
        .to_string(),
    )
    .unwrap();

    let config = TapConfig::from_file(&config_path).unwrap();
    let tokens = TokenManager::from_config(&config, http_client(&config).unwrap())
        .unwrap()
        .with_store(Arc::new(FileConfigStore::new(&config_path)));

    let token = tokens.get_token().await.unwrap();
    assert_eq!(token.value, "tok-persisted");
    assert_eq!(token.expires_at.timestamp(), created_at + 7200);

    let reloaded = TapConfig::from_file(&config_path).unwrap();
    assert_eq!(reloaded.access_token.as_deref(), Some("tok-persisted"));
    assert_eq!(reloaded.token_expires_at, Some(token.expires_at));
    assert_eq!(reloaded.client_secret, "secret");
}

// ============================================================================
// Response Failures
// ============================================================================

#[tokio::test]
async fn test_null_entity_data_is_schema_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"accounts": null}})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let catalog = Catalog::bunny().unwrap();
    let err = fetcher_for(&config)
        .fetch_page(catalog.get("accounts").unwrap(), None, &JsonObject::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.to_string().contains("null"));
}

#[tokio::test]
async fn test_graphql_error_path_reported() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field",
                "path": ["accounts", 3, "name"],
                "extensions": {"code": "INTERNAL_SERVER_ERROR"}
            }],
            "data": null
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let catalog = Catalog::bunny().unwrap();
    let err = fetcher_for(&config)
        .fetch_page(catalog.get("accounts").unwrap(), None, &JsonObject::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("accounts.3.name"));
    match err {
        Error::GraphQl { entity, errors, variables, .. } => {
            assert_eq!(entity, "accounts");
            assert_eq!(errors[0].joined_path().as_deref(), Some("accounts.3.name"));
            assert_eq!(variables, json!({"first": 100}));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_incremental_read_resumes_from_state_file() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"invoices": {
            "nodes": [
                {"id": "inv-1", "updatedAt": "2024-01-10T00:00:00Z"},
                {"id": "inv-2", "updatedAt": "2024-03-10T00:00:00Z"}
            ],
            "pageInfo": {"hasNextPage": false}
        }}})))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    std::fs::write(
        &state_path,
        r#"{"bookmarks": {"invoices": {"replication_key": "updatedAt", "replication_key_value": "2024-02-01T00:00:00Z"}}}"#,
    )
    .unwrap();

    let config = config_for(&server);
    let catalog = Catalog::bunny().unwrap();
    let engine = SyncEngine::new(fetcher_for(&config), StateManager::from_file(&state_path).unwrap());
    let emit = |_: Message| {};

    let stats = engine
        .sync_entity(catalog.get("invoices").unwrap(), &emit)
        .await
        .unwrap();

    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.records_skipped, 1);

    let saved = StateManager::from_file(&state_path).unwrap();
    assert_eq!(
        saved.get_bookmark("invoices").await.as_deref(),
        Some("2024-03-10T00:00:00Z")
    );
}
