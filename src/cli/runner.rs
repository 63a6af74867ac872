//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{resolve_auth, SyncSettings};
use crate::engine::{RunReport, RunStatus, SyncEngine};
use crate::error::Result;
use crate::http::HttpClient;
use crate::remote::RestRecordApi;
use serde_json::json;
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

    /// Run the CLI command.
    ///
    /// Errors are startup problems (settings, client construction). Problems
    /// during a run are carried by the returned status.
    pub async fn run(&self) -> Result<RunStatus> {
        match &self.cli.command {
            Commands::Run {
                dry_run,
                max_pages,
                batch_size,
            } => self.sync(*dry_run, *max_pages, *batch_size).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load settings from the file given with `--config`, then apply
    /// environment overrides
    fn load_settings(&self) -> Result<SyncSettings> {
        let settings = match &self.cli.config {
            Some(path) => SyncSettings::load(path)?,
            None => {
                info!("No settings file given, using defaults");
                SyncSettings::default()
            }
        };
        Ok(settings.with_env_overrides())
    }

    fn validate(&self) -> Result<RunStatus> {
        let settings = self.load_settings()?;
        settings.validate()?;

        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
            OutputFormat::Pretty => {
                println!("Settings OK");
                println!("  Base URL:     {}", settings.api.base_url);
                println!("  Filters:      {}", settings.search.filters.len());
                println!("  Page size:    {}", settings.search.page_size);
                println!("  Page ceiling: {}", settings.pipeline.page_ceiling);
                println!("  Batch size:   {}", settings.pipeline.batch_size);
                println!("  Attempts:     {}", settings.retry.max_attempts);
            }
        }
        Ok(RunStatus::Success)
    }

    async fn sync(
        &self,
        dry_run: bool,
        max_pages: Option<u32>,
        batch_size: Option<usize>,
    ) -> Result<RunStatus> {
        let mut settings = self.load_settings()?;
        if dry_run {
            settings.pipeline.dry_run = true;
        }
        if let Some(pages) = max_pages {
            settings.pipeline.page_ceiling = pages;
        }
        if let Some(size) = batch_size {
            settings.pipeline.batch_size = size;
        }
        settings.validate()?;

        let auth = resolve_auth(self.cli.token.clone());
        if auth.is_none() {
            warn!("No API token configured; requests are sent without credentials");
        }

        let client = HttpClient::with_auth(settings.http_config(), auth)?;
        let api = RestRecordApi::new(client, settings.api.clone());
        let mut engine = SyncEngine::new(&api).with_config(settings.sync_config());

        let report = engine.run(&settings.search_spec()).await;
        self.print_report(&report)?;

        Ok(report.status())
    }

    fn print_report(&self, report: &RunReport) -> Result<()> {
        let status = report.status();
        match self.cli.format {
            OutputFormat::Json => {
                let failures: Vec<_> = report.failures().collect();
                let output = json!({
                    "status": status.as_str(),
                    "stats": report.stats,
                    "failures": failures,
                    "error": report.error.as_ref().map(ToString::to_string),
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            OutputFormat::Pretty => {
                println!("Sync {}: {}", status.as_str(), report.summary());
                for failure in report.failures() {
                    println!(
                        "  FAILED {} -> {}: {}",
                        failure.record_id,
                        failure.owner,
                        failure.error.as_deref().unwrap_or("unknown error")
                    );
                }
                if let Some(e) = &report.error {
                    println!("  ERROR {e}");
                }
            }
        }
        Ok(())
    }
}
