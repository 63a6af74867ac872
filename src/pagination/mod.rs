//! Pagination module
//!
//! Drives cursor-based search: request a page, follow the opaque
//! continuation cursor, stop when the cursor disappears, the response is
//! malformed, or the page ceiling is reached.
//!
//! The [`Pager`] is a lazy, finite, non-restartable sequence of pages. It
//! can be pulled one page at a time with [`Pager::next_page`], consumed as a
//! `futures::Stream`, or drained with [`fetch_all_pages`].

mod pager;
mod types;

pub use pager::{fetch_all_pages, Pager};
pub use types::{FetchOutcome, PaginationState, StopReason};

#[cfg(test)]
mod tests;
