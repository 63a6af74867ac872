//! Execution engine module
//!
//! Main sync loop: fetch a page, enrich it, resolve owners, write them
//! back, advance the cursor, repeat until no cursor remains.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs the page loop as an explicit state machine
//! - `SyncConfig` - Configuration for sync runs
//! - `RunReport` - Stats, write outcomes and the fatal error of a run
//!
//! Pages are processed strictly one after another; page N+1 is not
//! requested until page N has been written. Only a failed page fetch ends
//! a run early, and the report still carries everything done before it.

mod types;

pub use types::{RunReport, RunStatus, Stage, SyncConfig, SyncStats};

use crate::attribution::Resolver;
use crate::enrich::Enricher;
use crate::error::Error;
use crate::pagination::Pager;
use crate::remote::{RecordApi, SearchSpec};
use crate::writer::BatchWriter;
use std::time::Instant;
use tracing::{debug, error, info};

/// Sync engine for re-attributing record owners
pub struct SyncEngine<'a> {
    /// Remote record API
    api: &'a dyn RecordApi,
    /// Sync configuration
    config: SyncConfig,
    /// Current stage
    stage: Stage,
}

impl<'a> SyncEngine<'a> {
    /// Create a new sync engine
    pub fn new(api: &'a dyn RecordApi) -> Self {
        Self {
            api,
            config: SyncConfig::default(),
            stage: Stage::Idle,
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get the current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    /// Run one full synchronization over every page matching `spec`
    pub async fn run(&mut self, spec: &SearchSpec) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::default();

        let api = self.api;
        let mut pager = Pager::new(api, spec, self.config.page_ceiling);
        let enricher = Enricher::new(api, self.config.concurrency);
        let resolver = Resolver::new(self.config.history_order);
        let writer = BatchWriter::new(api, self.config.batch_size);

        info!("Starting owner sync");

        loop {
            self.enter(Stage::Fetching);
            let page = match pager.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    self.enter(Stage::Done);
                    break;
                }
                Err(e) => {
                    let err = Error::fatal(report.stats.pages_fetched, e);
                    error!("{err}");
                    report.error = Some(err);
                    self.enter(Stage::Failed);
                    break;
                }
            };
            let page_number = report.stats.pages_fetched + 1;
            report.stats.add_page(page.records.len());

            self.enter(Stage::Enriching);
            let enriched = enricher.enrich_all(page.records).await;
            report.stats.records_enriched +=
                enriched.iter().filter(|e| e.related.is_some()).count();

            self.enter(Stage::Resolving);
            let mut updates = resolver.resolve_all(&enriched);
            report.stats.updates_resolved += updates.len();

            if self.config.skip_unchanged {
                let before = updates.len();
                updates.retain(|u| !u.is_unchanged());
                report.stats.updates_skipped += before - updates.len();
            }

            self.enter(Stage::Writing);
            let (written, failed) = if self.config.dry_run {
                for update in &updates {
                    info!(
                        "[dry run] Record {} would be updated to: {}",
                        update.record_id, update.owner
                    );
                }
                report.stats.updates_skipped += updates.len();
                (0, 0)
            } else {
                let outcomes = writer.write_all(&updates).await;
                report.stats.add_outcomes(&outcomes);
                let ok = outcomes.iter().filter(|o| o.success).count();
                let failed = outcomes.len() - ok;
                report.outcomes.extend(outcomes);
                (ok, failed)
            };

            info!(
                "Page {page_number}: {} records, {} enriched, {} updates, {written} written, {failed} failed",
                enriched.len(),
                enriched.iter().filter(|e| e.related.is_some()).count(),
                updates.len()
            );

            self.enter(Stage::Advancing);
        }

        report.stop_reason = pager.state().stop_reason;
        report.stats.set_duration(start.elapsed().as_millis() as u64);

        if report.error.is_none() {
            info!("All records have been processed: {}", report.summary());
        } else {
            error!("Sync aborted: {}", report.summary());
        }

        report
    }
}
