//! Remote record API
//!
//! The pipeline talks to the remote source only through [`RecordApi`]:
//! - search returns a page of records plus an optional next cursor
//! - association lookup returns zero or one related id
//! - detail lookup returns the related entity's owner history
//! - update writes a new owner for one record
//!
//! [`RestRecordApi`] implements it over the resilient [`HttpClient`](crate::http::HttpClient).

mod rest;
mod types;

pub use rest::RestRecordApi;
pub use types::{
    parse_timestamp, ApiConfig, OwnershipHistoryEntry, Page, Record, RelatedEntity, SearchFilter,
    SearchSpec,
};

use crate::error::Result;
use async_trait::async_trait;

/// Capability the pipeline needs from the remote source
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch one page of records matching `spec`, starting at `cursor`
    async fn search(&self, spec: &SearchSpec, cursor: Option<&str>) -> Result<Page>;

    /// Find the id of the entity associated with a record, if any
    async fn find_association(&self, record_id: &str) -> Result<Option<String>>;

    /// Fetch a related entity with its owner history
    async fn fetch_related(&self, related_id: &str) -> Result<Option<RelatedEntity>>;

    /// Set a record's owner
    async fn update_owner(&self, record_id: &str, owner: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing;
