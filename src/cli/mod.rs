//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Obtain a token and fetch one page
//! - `discover` - Print the entity catalog
//! - `streams` - List entity names
//! - `read` - Sync entities to stdout

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
