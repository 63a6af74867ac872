//! Enrichment fan-out
//!
//! Attaches each record's related entity (association lookup, then detail
//! lookup). Records of one page are enriched concurrently up to a cap, and
//! the output keeps the input order. A failed lookup degrades only the
//! record it belongs to.

use crate::error::{Error, Result};
use crate::remote::{Record, RecordApi, RelatedEntity};
use futures::StreamExt;
use tracing::{debug, warn};

/// A record together with its related entity, if one was found
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// The source record
    pub record: Record,
    /// Related entity with its owner history
    pub related: Option<RelatedEntity>,
}

impl EnrichedRecord {
    /// Wrap a record without enrichment
    pub fn bare(record: Record) -> Self {
        Self {
            record,
            related: None,
        }
    }

    /// Attach a related entity
    #[must_use]
    pub fn with_related(mut self, related: RelatedEntity) -> Self {
        self.related = Some(related);
        self
    }
}

/// Concurrent enricher bound to a record API
pub struct Enricher<'a> {
    api: &'a dyn RecordApi,
    concurrency: usize,
}

impl<'a> Enricher<'a> {
    /// Create an enricher running at most `concurrency` lookups at once
    pub fn new(api: &'a dyn RecordApi, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Enrich one record; lookup failures leave it unenriched
    pub async fn enrich(&self, record: Record) -> EnrichedRecord {
        match self.lookup(&record.id).await {
            Ok(related) => EnrichedRecord { record, related },
            Err(e) => {
                let e = Error::enrichment(&record.id, e.to_string());
                warn!("{e}");
                EnrichedRecord::bare(record)
            }
        }
    }

    /// Enrich a page of records, preserving input order
    pub async fn enrich_all(&self, records: Vec<Record>) -> Vec<EnrichedRecord> {
        futures::stream::iter(records)
            .map(|record| self.enrich(record))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn lookup(&self, record_id: &str) -> Result<Option<RelatedEntity>> {
        let Some(related_id) = self.api.find_association(record_id).await? else {
            debug!("Record {record_id} has no association");
            return Ok(None);
        };
        self.api.fetch_related(&related_id).await
    }
}
