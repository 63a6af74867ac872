//! CLI module
//!
//! Command-line interface for running a sync.
//!
//! # Commands
//!
//! - `run` - Fetch, resolve and write owners for every matching record
//! - `validate` - Load and check settings without touching the API

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
