//! CLI runner - executes commands

use crate::auth::TokenManager;
use crate::catalog::{Catalog, EntityDescriptor};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{FileConfigStore, TapConfig};
use crate::engine::{Message, SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::fetch::{http_client, PagingFetcher};
use crate::state::StateManager;
use crate::types::JsonObject;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Streams => self.streams(),
            Commands::Read {
                streams,
                max_pages,
                concurrency,
                fail_fast,
            } => {
                self.read(streams.as_deref(), *max_pages, *concurrency, *fail_fast)
                    .await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration given (use --config or --config-json)",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Load the entity catalog
    fn load_catalog(&self) -> Result<Catalog> {
        match &self.cli.catalog {
            Some(path) => Catalog::from_file(path),
            None => Catalog::bunny(),
        }
    }

    /// Build the fetcher and its token manager
    ///
    /// Refreshed tokens are written back only to a config file, never to
    /// inline config.
    fn build_fetcher(&self, config: &TapConfig) -> Result<PagingFetcher> {
        let mut tokens = TokenManager::from_config(config, http_client(config)?)?;
        if let (None, Some(path)) = (&self.cli.config_json, &self.cli.config) {
            tokens = tokens.with_store(Arc::new(FileConfigStore::new(path)));
        }
        PagingFetcher::from_config(config, Arc::new(tokens))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.load_catalog()?;
        let fetcher = self.build_fetcher(&config)?;

        let first = catalog
            .iter()
            .next()
            .ok_or_else(|| Error::config("Catalog has no entities"))?;

        info!(entity = %first.name, "Checking connection");
        let outcome = match fetcher.tokens().get_token().await {
            Ok(_) => fetcher
                .fetch_page(first, None, &JsonObject::new())
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => self.output_message(&json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "message": "Connection successful"
                }
            })),
            Err(e) => self.output_message(&json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "FAILED",
                    "message": format!("Connection failed: {e}")
                }
            })),
        }

        Ok(())
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        let catalog = self.load_catalog()?;
        let streams: Vec<Value> = catalog.iter().map(describe_entity).collect();

        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": { "streams": streams }
        }));

        Ok(())
    }

    /// List entity names
    fn streams(&self) -> Result<()> {
        let catalog = self.load_catalog()?;

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": catalog.names()
        }));

        Ok(())
    }

    /// Sync the selected entities
    async fn read(
        &self,
        streams: Option<&str>,
        max_pages: Option<usize>,
        concurrency: usize,
        fail_fast: bool,
    ) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.load_catalog()?;
        let entities = catalog.select(parse_stream_list(streams).as_slice())?;

        let state = self.load_state()?;
        let fetcher = self.build_fetcher(&config)?;

        let mut sync_config = SyncConfig::from_tap_config(&config)
            .with_concurrency(concurrency)
            .with_fail_fast(fail_fast);
        if let Some(max) = max_pages {
            sync_config = sync_config.with_max_pages(max);
        }
        let engine = SyncEngine::new(fetcher, state).with_config(sync_config);

        info!(entities = entities.len(), "Starting read");
        let emit = |msg: Message| self.output_engine_message(&msg);
        let report = engine.sync_all(&entities, &emit).await?;

        engine.state().save().await?;

        info!(
            completed = report.completed.len(),
            failed = report.failures.len(),
            records = report.total_records(),
            "Read finished"
        );

        if report.is_success() {
            Ok(())
        } else {
            let failed: Vec<String> = report
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.stream, f.error))
                .collect();
            Err(Error::Other(format!(
                "{} of {} entities failed: {}",
                report.failures.len(),
                entities.len(),
                failed.join("; ")
            )))
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match to_output(msg, self.cli.format) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Failed to serialize message"),
        }
    }

    /// Output an engine message
    fn output_engine_message(&self, msg: &Message) {
        match to_output(msg, self.cli.format) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Failed to serialize message"),
        }
    }
}

fn to_output<T: serde::Serialize>(msg: &T, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(msg),
        OutputFormat::Pretty => serde_json::to_string_pretty(msg),
    }
}

/// Split a comma-separated entity list, ignoring blanks
fn parse_stream_list(streams: Option<&str>) -> Vec<String> {
    streams
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Catalog entry of one entity
fn describe_entity(entity: &EntityDescriptor) -> Value {
    let replication_method = if entity.replication_key.is_some() {
        "INCREMENTAL"
    } else {
        "FULL_TABLE"
    };
    json!({
        "stream": entity.name,
        "tap_stream_id": entity.name,
        "key_properties": entity.primary_keys,
        "replication_key": entity.replication_key,
        "replication_method": replication_method,
        "page_size": entity.page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_stream_list() {
        assert!(parse_stream_list(None).is_empty());
        assert_eq!(
            parse_stream_list(Some(" accounts, ,invoices ")),
            vec!["accounts".to_string(), "invoices".to_string()]
        );
    }

    #[test]
    fn test_describe_entity() {
        let entity = EntityDescriptor::new("invoices", "q")
            .with_primary_keys(["id"])
            .with_replication_key("updatedAt")
            .with_page_size(100);

        assert_eq!(
            describe_entity(&entity),
            json!({
                "stream": "invoices",
                "tap_stream_id": "invoices",
                "key_properties": ["id"],
                "replication_key": "updatedAt",
                "replication_method": "INCREMENTAL",
                "page_size": 100
            })
        );
    }

    #[test]
    fn test_pretty_output() {
        let line = to_output(&json!({"a": 1}), OutputFormat::Pretty).unwrap();
        assert!(line.contains('\n'));
        assert_eq!(to_output(&json!({"a": 1}), OutputFormat::Json).unwrap(), r#"{"a":1}"#);
    }
}
