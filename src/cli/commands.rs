//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Re-attribute record owners from the owner history of a related entity
#[derive(Parser, Debug)]
#[command(name = "owner-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API token (defaults to OWNER_SYNC_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format for the run report
    #[arg(short, long, global = true, default_value = "pretty")]
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
    /// Run the sync
    Run {
        /// Resolve owners without writing them
        #[arg(long)]
        dry_run: bool,

        /// Maximum pages to process
        #[arg(long)]
        max_pages: Option<u32>,

        /// Maximum concurrent writes per chunk
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Validate the settings file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report on stdout
    Json,
    /// Human-readable summary
    Pretty,
}
