//! Attribution resolver
//!
//! An owner history is a step function over time. For each enriched record
//! the resolver looks up which owner was in effect at the record's creation
//! instant:
//!
//! - the entry `i` whose interval `[ts[i], ts[i + 1])` contains the instant
//! - otherwise the last entry (the instant is newer than every change,
//!   older than every change, or the history has one entry)
//!
//! Resolution is a pure function of the creation instant and the history.

use crate::enrich::EnrichedRecord;
use crate::remote::OwnershipHistoryEntry;
use crate::types::HistoryOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The owner value to write for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUpdate {
    /// Record to update
    pub record_id: String,
    /// Owner value to write
    pub owner: String,
    /// Owner the record had when it was fetched
    pub previous_owner: Option<String>,
}

impl ResolvedUpdate {
    /// Create an update
    pub fn new(record_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            owner: owner.into(),
            previous_owner: None,
        }
    }

    /// Whether the write would leave the owner as it is
    pub fn is_unchanged(&self) -> bool {
        self.previous_owner.as_deref() == Some(self.owner.as_str())
    }
}

/// Resolves enriched records to owner updates
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    order: HistoryOrder,
}

impl Resolver {
    /// Create a resolver
    pub fn new(order: HistoryOrder) -> Self {
        Self { order }
    }

    /// Resolve one record. `None` means the record gets no update: no
    /// related entity, no usable history, no creation instant, or the
    /// selected entry carries no value.
    pub fn resolve(&self, enriched: &EnrichedRecord) -> Option<ResolvedUpdate> {
        let record = &enriched.record;
        let related = enriched.related.as_ref()?;
        if related.history.is_empty() {
            return None;
        }

        let mut entries: Vec<&OwnershipHistoryEntry> = related.history.iter().collect();
        if self.order == HistoryOrder::SortAscending {
            entries.sort_by_key(|e| e.timestamp);
        }

        if !entries.iter().any(|e| e.is_complete()) {
            debug!("Record {}: history has no complete entry", record.id);
            return None;
        }

        let Some(created_at) = record.created_at else {
            debug!("Record {}: no creation timestamp", record.id);
            return None;
        };

        let selected = select_entry(created_at, &entries)?;
        let owner = selected.value.clone()?;

        Some(ResolvedUpdate {
            record_id: record.id.clone(),
            owner,
            previous_owner: record.owner.clone(),
        })
    }

    /// Resolve a page, dropping records without an update
    pub fn resolve_all(&self, enriched: &[EnrichedRecord]) -> Vec<ResolvedUpdate> {
        enriched.iter().filter_map(|e| self.resolve(e)).collect()
    }
}

/// Pick the entry in effect at `at`: the first `i` with
/// `ts[i] <= at < ts[i + 1]`, else the last entry. Entries without a
/// timestamp never bound an interval.
pub fn select_entry<'a>(
    at: DateTime<Utc>,
    entries: &[&'a OwnershipHistoryEntry],
) -> Option<&'a OwnershipHistoryEntry> {
    entries
        .windows(2)
        .find(|pair| match (pair[0].timestamp, pair[1].timestamp) {
            (Some(start), Some(end)) => start <= at && at < end,
            _ => false,
        })
        .map(|pair| pair[0])
        .or_else(|| entries.last().copied())
}
