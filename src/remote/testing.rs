//! In-memory record API for unit tests

use super::{Page, RecordApi, RelatedEntity, SearchSpec};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted `RecordApi`. Pages are keyed by the cursor that requests them
/// (`None` for the first page).
#[derive(Default)]
pub(crate) struct FakeApi {
    pub pages: HashMap<Option<String>, Result<Page>>,
    pub associations: HashMap<String, String>,
    pub related: HashMap<String, RelatedEntity>,
    pub failing_associations: HashSet<String>,
    pub failing_details: HashSet<String>,
    pub failing_writes: HashSet<String>,
    /// Per-record delay on association lookups, to shuffle completion order
    pub association_delays: HashMap<String, Duration>,
    pub search_calls: Mutex<Vec<Option<String>>>,
    pub writes: Mutex<Vec<(String, String)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, cursor: Option<&str>, page: Page) -> Self {
        self.pages.insert(cursor.map(str::to_string), Ok(page));
        self
    }

    pub fn failing_page(mut self, cursor: Option<&str>, error: Error) -> Self {
        self.pages.insert(cursor.map(str::to_string), Err(error));
        self
    }

    pub fn association(mut self, record_id: &str, related_id: &str) -> Self {
        self.associations
            .insert(record_id.to_string(), related_id.to_string());
        self
    }

    pub fn related(mut self, entity: RelatedEntity) -> Self {
        self.related.insert(entity.id.clone(), entity);
        self
    }

    pub fn fail_write(mut self, record_id: &str) -> Self {
        self.failing_writes.insert(record_id.to_string());
        self
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<Option<String>> {
        self.search_calls.lock().unwrap().clone()
    }
}

fn clone_result(result: &Result<Page>) -> Result<Page> {
    match result {
        Ok(page) => Ok(page.clone()),
        Err(Error::RetryExhausted {
            attempts,
            last_status,
        }) => Err(Error::RetryExhausted {
            attempts: *attempts,
            last_status: *last_status,
        }),
        Err(Error::DataShape { message }) => Err(Error::data_shape(message.clone())),
        Err(other) => Err(Error::Other(other.to_string())),
    }
}

#[async_trait]
impl RecordApi for FakeApi {
    async fn search(&self, _spec: &SearchSpec, cursor: Option<&str>) -> Result<Page> {
        let key = cursor.map(str::to_string);
        self.search_calls.lock().unwrap().push(key.clone());
        match self.pages.get(&key) {
            Some(result) => clone_result(result),
            None => Ok(Page::default()),
        }
    }

    async fn find_association(&self, record_id: &str) -> Result<Option<String>> {
        if let Some(delay) = self.association_delays.get(record_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_associations.contains(record_id) {
            return Err(Error::RetryExhausted {
                attempts: 3,
                last_status: Some(503),
            });
        }
        Ok(self.associations.get(record_id).cloned())
    }

    async fn fetch_related(&self, related_id: &str) -> Result<Option<RelatedEntity>> {
        if self.failing_details.contains(related_id) {
            return Err(Error::http_status(500, "boom"));
        }
        Ok(self.related.get(related_id).cloned())
    }

    async fn update_owner(&self, record_id: &str, owner: &str) -> Result<()> {
        if self.failing_writes.contains(record_id) {
            return Err(Error::http_status(400, "invalid owner"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((record_id.to_string(), owner.to_string()));
        Ok(())
    }
}
