//! Pagination state and results

use crate::error::Error;
use crate::remote::{Page, Record};

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last response carried no next cursor
    Exhausted,
    /// The configured page ceiling was reached
    PageCeiling,
    /// A response was missing its results; treated as a soft stop
    DataShape,
    /// A page could not be fetched
    Failed,
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub page: u32,
    /// Cursor for the next request; `None` before the first page
    pub cursor: Option<String>,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
    /// Set once `done` is
    pub stop_reason: Option<StopReason>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn finish(&mut self, reason: StopReason) {
        self.done = true;
        self.stop_reason = Some(reason);
    }

    /// Record a fetched page
    pub fn advance(&mut self, records: usize, next_cursor: Option<String>) {
        self.page += 1;
        self.total_fetched += records as u64;
        self.cursor = next_cursor;
    }
}

/// Every page fetched before pagination ended, plus the error that ended
/// it, if any. Pages fetched before a failure are kept.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Pages in fetch order
    pub pages: Vec<Page>,
    /// Fatal fetch error
    pub error: Option<Error>,
    /// Why pagination ended
    pub stop_reason: Option<StopReason>,
}

impl FetchOutcome {
    /// All records across pages, in order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.pages.iter().flat_map(|p| p.records.iter())
    }

    /// Whether pagination ended without a fatal error
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}
