//! Cursor pager over a `RecordApi`

use super::types::{FetchOutcome, PaginationState, StopReason};
use crate::error::{Error, Result};
use crate::remote::{Page, RecordApi, SearchSpec};
use futures::Stream;
use tracing::{debug, info, warn};

/// Lazy sequence of search pages
pub struct Pager<'a> {
    api: &'a dyn RecordApi,
    spec: &'a SearchSpec,
    page_ceiling: u32,
    state: PaginationState,
}

impl<'a> Pager<'a> {
    /// Create a pager; nothing is fetched until the first `next_page`
    pub fn new(api: &'a dyn RecordApi, spec: &'a SearchSpec, page_ceiling: u32) -> Self {
        Self {
            api,
            spec,
            page_ceiling,
            state: PaginationState::new(),
        }
    }

    /// Get the pagination state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once pagination has ended. A data-shape problem
    /// ends pagination quietly; any other error is returned once and ends it.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.state.done {
            return Ok(None);
        }
        if self.state.page >= self.page_ceiling {
            info!("Page ceiling of {} reached", self.page_ceiling);
            self.state.finish(StopReason::PageCeiling);
            return Ok(None);
        }

        let cursor = self.state.cursor.clone();
        debug!("Fetching page {} (cursor {:?})", self.state.page + 1, cursor);

        match self.api.search(self.spec, cursor.as_deref()).await {
            Ok(page) => {
                self.state
                    .advance(page.records.len(), page.next_cursor.clone());
                info!(
                    "Fetched page {} with {} records",
                    self.state.page,
                    page.records.len()
                );

                if page.next_cursor.is_none() {
                    self.state.finish(StopReason::Exhausted);
                } else if self.state.page >= self.page_ceiling {
                    info!("Page ceiling of {} reached", self.page_ceiling);
                    self.state.finish(StopReason::PageCeiling);
                }
                Ok(Some(page))
            }
            Err(Error::DataShape { message }) => {
                warn!("Stopping pagination: {message}");
                self.state.finish(StopReason::DataShape);
                Ok(None)
            }
            Err(e) => {
                self.state.finish(StopReason::Failed);
                Err(e)
            }
        }
    }

    /// Consume the pager as a stream of pages. A fatal error is yielded
    /// as the final item.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> + Send + 'a {
        futures::stream::unfold(Some(self), |pager| async move {
            let mut pager = pager?;
            match pager.next_page().await {
                Ok(Some(page)) => Some((Ok(page), Some(pager))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Fetch every page, keeping the pages gathered before any failure
pub async fn fetch_all_pages(
    api: &dyn RecordApi,
    spec: &SearchSpec,
    page_ceiling: u32,
) -> FetchOutcome {
    let mut pager = Pager::new(api, spec, page_ceiling);
    let mut outcome = FetchOutcome::default();

    loop {
        match pager.next_page().await {
            Ok(Some(page)) => outcome.pages.push(page),
            Ok(None) => break,
            Err(e) => {
                outcome.error = Some(e);
                break;
            }
        }
    }

    outcome.stop_reason = pager.state().stop_reason;
    outcome
}
