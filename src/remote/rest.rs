//! REST implementation of the record API

use super::types::{
    results_array, ApiConfig, OwnershipHistoryEntry, Page, Record, RelatedEntity, SearchSpec,
};
use super::RecordApi;
use crate::error::Result;
use crate::http::{ensure_success, HttpClient, RequestConfig};
use crate::template::{self, TemplateContext};
use crate::types::{scalar_to_string, JsonValue, Method, OptionStringExt};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

/// Record API over HTTP
#[derive(Debug, Clone)]
pub struct RestRecordApi {
    client: HttpClient,
    config: ApiConfig,
}

impl RestRecordApi {
    /// Create an API bound to a client. Relative endpoint paths are joined
    /// to the client's base URL.
    pub fn new(client: HttpClient, config: ApiConfig) -> Self {
        Self { client, config }
    }

    /// Get the endpoint configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn record_path(&self, template: &str, record_id: &str) -> Result<String> {
        let ctx = TemplateContext::new().with("record_id", record_id);
        template::render(template, &ctx)
    }

    async fn send_json(&self, method: Method, path: &str, config: RequestConfig) -> Result<JsonValue> {
        self.client.request_json(method, path, config).await
    }
}

#[async_trait]
impl RecordApi for RestRecordApi {
    async fn search(&self, spec: &SearchSpec, cursor: Option<&str>) -> Result<Page> {
        let config = RequestConfig::new().json(spec.to_body(cursor));
        let body = self
            .send_json(Method::POST, &self.config.search_path, config)
            .await?;

        let mut records = Vec::new();
        for item in results_array(&body, "search")? {
            match Record::from_json(
                item,
                &self.config.created_property,
                &self.config.owner_property,
            ) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping search result: {e}"),
            }
        }

        let next_cursor = body
            .pointer("/paging/next/after")
            .and_then(scalar_to_string)
            .none_if_empty();

        debug!(
            "Search page: {} records, next cursor {:?}",
            records.len(),
            next_cursor
        );
        Ok(Page::new(records, next_cursor))
    }

    async fn find_association(&self, record_id: &str) -> Result<Option<String>> {
        let path = self.record_path(&self.config.association_path, record_id)?;
        let body = self
            .send_json(Method::GET, &path, RequestConfig::new())
            .await?;

        Ok(body
            .get("results")
            .and_then(JsonValue::as_array)
            .and_then(|results| results.first())
            .and_then(|first| first.get("id"))
            .and_then(scalar_to_string)
            .none_if_empty())
    }

    async fn fetch_related(&self, related_id: &str) -> Result<Option<RelatedEntity>> {
        let request = json!({
            "propertiesWithHistory": [self.config.owner_property],
            "inputs": [{ "id": related_id }],
        });
        let body = self
            .send_json(
                Method::POST,
                &self.config.detail_path,
                RequestConfig::new().json(request),
            )
            .await?;

        let Some(entity) = results_array(&body, "detail")?.first() else {
            return Ok(None);
        };

        let id = entity
            .get("id")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| related_id.to_string());

        let history = entity
            .get("propertiesWithHistory")
            .and_then(|p| p.get(&self.config.owner_property))
            .and_then(JsonValue::as_array)
            .map(|entries| entries.iter().map(OwnershipHistoryEntry::from_json).collect())
            .unwrap_or_default();

        Ok(Some(RelatedEntity::new(id, history)))
    }

    async fn update_owner(&self, record_id: &str, owner: &str) -> Result<()> {
        let path = self.record_path(&self.config.update_path, record_id)?;
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.config.owner_property.clone(),
            JsonValue::String(owner.to_string()),
        );
        let config = RequestConfig::new().json(json!({ "properties": properties }));

        let response = self.client.request(Method::PATCH, &path, config).await?;
        ensure_success(response).await?;
        Ok(())
    }
}
