//! Batch writer
//!
//! Writes resolved owners back in fixed-size chunks. Writes within a chunk
//! run concurrently and each one succeeds or fails on its own; there is no
//! rollback across a chunk. Chunks run one after another.

use crate::attribution::ResolvedUpdate;
use crate::error::Error;
use crate::remote::RecordApi;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Result of one write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Record that was written
    pub record_id: String,
    /// Owner value attempted
    pub owner: String,
    /// Whether the write succeeded
    pub success: bool,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutcome {
    /// A successful write
    pub fn succeeded(update: &ResolvedUpdate) -> Self {
        Self {
            record_id: update.record_id.clone(),
            owner: update.owner.clone(),
            success: true,
            error: None,
        }
    }

    /// A failed write
    pub fn failed(update: &ResolvedUpdate, error: impl Into<String>) -> Self {
        Self {
            record_id: update.record_id.clone(),
            owner: update.owner.clone(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Chunked, failure-tolerant writer
pub struct BatchWriter<'a> {
    api: &'a dyn RecordApi,
    batch_size: usize,
}

impl<'a> BatchWriter<'a> {
    /// Create a writer issuing at most `batch_size` writes at once
    pub fn new(api: &'a dyn RecordApi, batch_size: usize) -> Self {
        Self {
            api,
            batch_size: batch_size.max(1),
        }
    }

    /// Write every update, returning one outcome per update in input order
    pub async fn write_all(&self, updates: &[ResolvedUpdate]) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::with_capacity(updates.len());

        for (index, chunk) in updates.chunks(self.batch_size).enumerate() {
            debug!("Writing chunk {} ({} updates)", index + 1, chunk.len());
            let results =
                futures::future::join_all(chunk.iter().map(|update| self.write_one(update)))
                    .await;
            outcomes.extend(results);
        }

        outcomes
    }

    /// Write one update
    pub async fn write_one(&self, update: &ResolvedUpdate) -> WriteOutcome {
        match self
            .api
            .update_owner(&update.record_id, &update.owner)
            .await
        {
            Ok(()) => {
                info!(
                    "Record {} --> owner updated to: {}",
                    update.record_id, update.owner
                );
                WriteOutcome::succeeded(update)
            }
            Err(e) => {
                let e = Error::write(&update.record_id, e.to_string());
                error!("{e}");
                WriteOutcome::failed(update, e.to_string())
            }
        }
    }
}
