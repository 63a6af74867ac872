// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! owner-sync CLI
//!
//! Command-line interface for running an owner sync

use anyhow::Context;
use clap::Parser;
use owner_sync::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = cli.config.clone();
    let runner = Runner::new(cli);

    // Startup errors leave through `main` and exit with status 1
    let status = runner.run().await.with_context(|| match &config {
        Some(path) => format!("owner-sync failed to start with settings {}", path.display()),
        None => "owner-sync failed to start".to_string(),
    })?;
    std::process::exit(status.exit_code())
}
