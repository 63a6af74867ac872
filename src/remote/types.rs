//! Record API data model
//!
//! Records, pages and owner histories as the pipeline sees them, plus the
//! endpoint and search configuration of the REST collaborator.

use crate::error::{Error, Result};
use crate::types::{json_path, scalar_to_string, JsonObject, JsonValue, OptionStringExt};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// Records and Pages
// ============================================================================

/// A record fetched from the remote source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: String,
    /// Creation instant; `None` when the source value was missing or unparseable
    pub created_at: Option<DateTime<Utc>>,
    /// Current owner value
    pub owner: Option<String>,
    /// All returned properties
    pub properties: JsonObject,
}

impl Record {
    /// Create a record with no extra properties
    pub fn new(id: impl Into<String>, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            created_at,
            owner: None,
            properties: JsonObject::new(),
        }
    }

    /// Set the current owner
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Build a record from a search result object
    pub fn from_json(value: &JsonValue, created_property: &str, owner_property: &str) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(scalar_to_string)
            .none_if_empty()
            .ok_or_else(|| Error::data_shape("search result without an id"))?;

        let properties = value
            .get("properties")
            .and_then(JsonValue::as_object)
            .cloned()
            .unwrap_or_default();

        let created_at = properties
            .get(created_property)
            .and_then(parse_timestamp);
        let owner = properties
            .get(owner_property)
            .and_then(scalar_to_string)
            .none_if_empty();

        Ok(Self {
            id,
            created_at,
            owner,
            properties,
        })
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in source order
    pub records: Vec<Record>,
    /// Cursor for the next page; `None` ends pagination
    pub next_cursor: Option<String>,
}

impl Page {
    /// Create a page
    pub fn new(records: Vec<Record>, next_cursor: Option<String>) -> Self {
        Self {
            records,
            next_cursor,
        }
    }

    /// Whether another page follows
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}

// ============================================================================
// Related Entity
// ============================================================================

/// One change in a related entity's owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipHistoryEntry {
    /// Owner value set by this change
    pub value: Option<String>,
    /// When the change happened
    pub timestamp: Option<DateTime<Utc>>,
}

impl OwnershipHistoryEntry {
    /// Create an entry with both fields present
    pub fn new(value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: Some(value.into()),
            timestamp: Some(timestamp),
        }
    }

    /// Whether both the value and the timestamp are present
    pub fn is_complete(&self) -> bool {
        self.value.is_some() && self.timestamp.is_some()
    }

    /// Parse a `{value, timestamp}` history object
    pub fn from_json(value: &JsonValue) -> Self {
        Self {
            value: value.get("value").and_then(scalar_to_string),
            timestamp: value.get("timestamp").and_then(parse_timestamp),
        }
    }
}

/// The entity associated with a record, with its owner history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedEntity {
    /// Identifier
    pub id: String,
    /// Owner changes in API order
    pub history: Vec<OwnershipHistoryEntry>,
}

impl RelatedEntity {
    /// Create a related entity
    pub fn new(id: impl Into<String>, history: Vec<OwnershipHistoryEntry>) -> Self {
        Self {
            id: id.into(),
            history,
        }
    }
}

/// Parse a timestamp given as RFC 3339 text or epoch milliseconds
pub fn parse_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            s.parse::<i64>()
                .ok()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        }
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

// ============================================================================
// Search Spec
// ============================================================================

/// One filter clause of a search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Property to filter on
    #[serde(alias = "property")]
    pub property_name: String,
    /// Operator such as `EQ` or `BETWEEN`
    pub operator: String,
    /// Comparison value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    /// Upper bound for range operators
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "high_value")]
    pub high_value: Option<JsonValue>,
}

impl SearchFilter {
    /// Equality filter
    pub fn eq(property: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            property_name: property.into(),
            operator: "EQ".to_string(),
            value: Some(value.into()),
            high_value: None,
        }
    }

    /// Inclusive range filter
    pub fn between(
        property: impl Into<String>,
        low: impl Into<JsonValue>,
        high: impl Into<JsonValue>,
    ) -> Self {
        Self {
            property_name: property.into(),
            operator: "BETWEEN".to_string(),
            value: Some(low.into()),
            high_value: Some(high.into()),
        }
    }
}

/// What to search for: filters, requested properties and page size.
///
/// Omitted fields fall back to the deals created between 2021-01-04 and
/// 2021-01-15 in pipeline `8214425`, with owner and creation date returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Filters combined with AND
    #[serde(default = "default_filters")]
    pub filters: Vec<SearchFilter>,
    /// Properties to return on each record
    #[serde(default = "default_properties")]
    pub properties: Vec<String>,
    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_filters() -> Vec<SearchFilter> {
    vec![
        SearchFilter::between("createdate", "2021-01-04T00:00:00Z", "2021-01-15T23:59:59Z"),
        SearchFilter::eq("pipeline", "8214425"),
    ]
}

fn default_properties() -> Vec<String> {
    vec!["hubspot_owner_id".to_string(), "createdate".to_string()]
}

fn default_page_size() -> u32 {
    100
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            filters: default_filters(),
            properties: default_properties(),
            page_size: default_page_size(),
        }
    }
}

impl SearchSpec {
    /// Build the request body for one page
    pub fn to_body(&self, cursor: Option<&str>) -> JsonValue {
        let mut body = json!({
            "filterGroups": [{ "filters": self.filters }],
            "properties": self.properties,
            "limit": self.page_size,
        });
        if let Some(cursor) = cursor {
            body["after"] = JsonValue::String(cursor.to_string());
        }
        body
    }

    /// Add `names` to the requested properties if missing
    #[must_use]
    pub fn with_properties<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            if !self.properties.iter().any(|p| p == name) {
                self.properties.push(name.to_string());
            }
        }
        self
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Endpoints and property names of the REST collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for all endpoints
    pub base_url: String,
    /// Search endpoint (POST)
    pub search_path: String,
    /// Association lookup (GET), templated on `record_id`
    pub association_path: String,
    /// Batch detail read (POST)
    pub detail_path: String,
    /// Partial update (PATCH), templated on `record_id`
    pub update_path: String,
    /// Owner property on records and on the related entity
    pub owner_property: String,
    /// Creation timestamp property on records
    pub created_property: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hubapi.com".to_string(),
            search_path: "/crm/v3/objects/deals/search".to_string(),
            association_path: "/crm/v3/objects/deals/{{ record_id }}/associations/companies"
                .to_string(),
            detail_path: "/crm/v3/objects/companies/batch/read".to_string(),
            update_path: "/crm/v3/objects/deals/{{ record_id }}".to_string(),
            owner_property: "hubspot_owner_id".to_string(),
            created_property: "createdate".to_string(),
        }
    }
}

/// Read the `results` array of a response body
pub(crate) fn results_array<'a>(body: &'a JsonValue, what: &str) -> Result<&'a Vec<JsonValue>> {
    json_path(body, "results")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::data_shape(format!("{what} response has no results array")))
}
