//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bunny GraphQL extractor
#[derive(Parser, Debug)]
#[command(name = "tap-bunny")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON); refreshed tokens are written back to it
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Entity catalog (YAML); the built-in Bunny catalog when omitted
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain a token and fetch one page of the first entity
    Check,

    /// Print the entity catalog
    Discover,

    /// List entity names
    Streams,

    /// Sync entities, writing RECORD and STATE messages to stdout
    Read {
        /// Entities to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Maximum pages per entity
        #[arg(long)]
        max_pages: Option<usize>,

        /// Entities synced at once
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Stop at the first failed entity
        #[arg(long)]
        fail_fast: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
