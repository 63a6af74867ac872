//! Engine types
//!
//! Configuration, stages, statistics and the final report of a run.

use crate::error::Error;
use crate::pagination::StopReason;
use crate::types::HistoryOrder;
use crate::writer::WriteOutcome;
use serde::Serialize;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Not started
    #[default]
    Idle,
    /// Requesting the next page
    Fetching,
    /// Looking up related entities
    Enriching,
    /// Choosing owners
    Resolving,
    /// Writing owners back
    Writing,
    /// Moving the cursor forward
    Advancing,
    /// All pages processed
    Done,
    /// A page could not be fetched
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Enriching => "enriching",
            Stage::Resolving => "resolving",
            Stage::Writing => "writing",
            Stage::Advancing => "advancing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Configuration for a sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Updates written concurrently per chunk
    pub batch_size: usize,
    /// Maximum pages per run
    pub page_ceiling: u32,
    /// Maximum concurrent enrichment lookups
    pub concurrency: usize,
    /// How owner histories are ordered before resolution
    pub history_order: HistoryOrder,
    /// Resolve without writing
    pub dry_run: bool,
    /// Skip updates that would not change the owner
    pub skip_unchanged: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            page_ceiling: 100,
            concurrency: 10,
            history_order: HistoryOrder::AsGiven,
            dry_run: false,
            skip_unchanged: false,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set page ceiling
    #[must_use]
    pub fn with_page_ceiling(mut self, pages: u32) -> Self {
        self.page_ceiling = pages;
        self
    }

    /// Set enrichment concurrency
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set history order
    #[must_use]
    pub fn with_history_order(mut self, order: HistoryOrder) -> Self {
        self.history_order = order;
        self
    }

    /// Set dry-run mode
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip no-op updates
    #[must_use]
    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Pages fetched
    pub pages_fetched: usize,
    /// Records fetched
    pub records_fetched: usize,
    /// Records with a related entity attached
    pub records_enriched: usize,
    /// Updates produced by the resolver
    pub updates_resolved: usize,
    /// Updates not written (dry run or unchanged)
    pub updates_skipped: usize,
    /// Successful writes
    pub writes_succeeded: usize,
    /// Failed writes
    pub writes_failed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.records_fetched += records;
    }

    /// Count write outcomes
    pub fn add_outcomes(&mut self, outcomes: &[WriteOutcome]) {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        self.writes_succeeded += succeeded;
        self.writes_failed += outcomes.len() - succeeded;
    }

    /// Writes attempted
    pub fn writes_attempted(&self) -> usize {
        self.writes_succeeded + self.writes_failed
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// How a run ended, mapped to process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// All pages processed; individual write failures allowed
    Success,
    /// A page fetch failed after retries
    FetchFailed,
    /// Writes were attempted and every one failed
    WriteFailed,
}

impl RunStatus {
    /// Short label
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::FetchFailed => "fetch_failed",
            RunStatus::WriteFailed => "write_failed",
        }
    }

    /// Process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::FetchFailed => 2,
            RunStatus::WriteFailed => 3,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct RunReport {
    /// Counters
    pub stats: SyncStats,
    /// One outcome per write, in write order
    pub outcomes: Vec<WriteOutcome>,
    /// The run-fatal error, if any
    pub error: Option<Error>,
    /// Why pagination ended
    pub stop_reason: Option<StopReason>,
}

impl RunReport {
    /// Outcomes of failed writes
    pub fn failures(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// How the run ended
    pub fn status(&self) -> RunStatus {
        if self.error.is_some() {
            RunStatus::FetchFailed
        } else if self.stats.writes_attempted() > 0 && self.stats.writes_succeeded == 0 {
            RunStatus::WriteFailed
        } else {
            RunStatus::Success
        }
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        let s = &self.stats;
        format!(
            "{} pages, {} records processed, {} updates resolved, {} updated, {} failed, {} skipped in {}ms",
            s.pages_fetched,
            s.records_fetched,
            s.updates_resolved,
            s.writes_succeeded,
            s.writes_failed,
            s.updates_skipped,
            s.duration_ms
        )
    }
}
