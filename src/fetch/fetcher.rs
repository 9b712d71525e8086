//! Paging fetcher implementation

use crate::auth::{Token, TokenManager};
use crate::catalog::EntityDescriptor;
use crate::config::TapConfig;
use crate::decode::decode_page;
use crate::error::{Error, Result};
use crate::graphql::GraphQlRequest;
use crate::pagination::{PageCursor, PaginationPolicy};
use crate::types::{JsonObject, JsonValue, Record};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("tap-bunny/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by token exchanges and GraphQL requests
pub fn http_client(config: &TapConfig) -> Result<Client> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let client = Client::builder()
        .timeout(config.timeout())
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Records of one page and the cursor of the next
#[derive(Debug, Clone)]
pub struct Page {
    /// Post-processed records in response order
    pub records: Vec<Record>,
    /// Cursor of the next page; `None` once the walk is complete
    pub next_cursor: Option<PageCursor>,
    /// Items the server returned before filtering
    pub item_count: usize,
}

impl Page {
    /// Whether another page follows
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Fetches entity pages from the GraphQL endpoint
pub struct PagingFetcher {
    client: Client,
    graphql_url: Url,
    tokens: Arc<TokenManager>,
    policy: PaginationPolicy,
}

impl PagingFetcher {
    /// Create a fetcher posting to `graphql_url`
    pub fn new(client: Client, graphql_url: Url, tokens: Arc<TokenManager>) -> Self {
        Self {
            client,
            graphql_url,
            tokens,
            policy: PaginationPolicy::strict(),
        }
    }

    /// Build a fetcher from tap configuration
    pub fn from_config(config: &TapConfig, tokens: Arc<TokenManager>) -> Result<Self> {
        let policy = PaginationPolicy {
            full_page_heuristic: config.full_page_heuristic,
        };
        Ok(Self::new(http_client(config)?, config.graphql_url()?, tokens).with_policy(policy))
    }

    /// Set the pagination policy
    #[must_use]
    pub fn with_policy(mut self, policy: PaginationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Token manager shared with other fetch paths
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// GraphQL endpoint
    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    /// Fetch one page of `entity`
    ///
    /// `variables` overlay the entity's own; `after` is added when a cursor
    /// is given.
    pub async fn fetch_page(
        &self,
        entity: &EntityDescriptor,
        cursor: Option<&PageCursor>,
        variables: &JsonObject,
    ) -> Result<Page> {
        let name = entity.name.as_str();
        let query = entity.query_document();
        let variables = request_variables(entity, cursor, variables);

        let token = self.tokens.get_token().await?;
        let mut response = self.send(&query, &variables, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(entity = name, "GraphQL request unauthorized, refreshing token");
            let token = self.tokens.force_refresh().await?;
            response = self.send(&query, &variables, &token).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::auth(format!(
                    "GraphQL request for '{name}' still unauthorized after token refresh"
                )));
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(name, status.as_u16(), &body));
        }

        let body = response.text().await?;
        let decoded = decode_page(entity, &body, &variables)?;

        let item_count = decoded.item_count();
        let next_cursor = self.policy.next_cursor(
            name,
            decoded.page_info.as_ref(),
            item_count,
            entity.page_size,
        )?;

        let records: Vec<Record> = decoded
            .records
            .into_iter()
            .filter_map(|record| entity.apply_post_process(record))
            .collect();

        debug!(
            entity = name,
            items = item_count,
            records = records.len(),
            has_next = next_cursor.is_some(),
            "Fetched page"
        );

        Ok(Page {
            records,
            next_cursor,
            item_count,
        })
    }

    async fn send(&self, query: &str, variables: &JsonObject, token: &Token) -> Result<Response> {
        let response = self
            .client
            .post(self.graphql_url.clone())
            .bearer_auth(&token.value)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;
        Ok(response)
    }
}

/// Entity variables, overlaid by caller variables, plus `after`
fn request_variables(
    entity: &EntityDescriptor,
    cursor: Option<&PageCursor>,
    overrides: &JsonObject,
) -> JsonObject {
    let mut variables = entity.variables.clone();
    for (key, value) in overrides {
        variables.insert(key.clone(), value.clone());
    }
    if let Some(cursor) = cursor {
        variables.insert("after".to_string(), JsonValue::String(cursor.to_string()));
    }
    variables
}
