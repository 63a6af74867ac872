//! Settings for a sync run
//!
//! Settings are loaded from a YAML file in which every field is optional,
//! then adjusted by environment overrides and validated before use.

use crate::auth::AuthConfig;
use crate::engine::SyncConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::remote::{ApiConfig, SearchSpec};
use crate::types::{BackoffType, HistoryOrder, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the API credential
pub const TOKEN_ENV: &str = "OWNER_SYNC_TOKEN";

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "OWNER_SYNC_BASE_URL";

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Complete settings loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Endpoints and property names
    pub api: ApiConfig,

    /// Which records to process
    pub search: SearchSpec,

    /// Transport retry policy
    pub retry: RetryConfig,

    /// Engine settings
    pub pipeline: PipelineConfig,

    /// Optional client-side rate limit
    pub rate_limit: Option<RateLimiterConfig>,
}

// ============================================================================
// Retry Config
// ============================================================================

/// Transport retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total sends per request, the first one included
    #[serde(alias = "max_retries")]
    pub max_attempts: u32,

    /// Base delay between attempts
    pub base_delay_ms: u64,

    /// Upper bound on any delay, server hints included
    pub max_delay_ms: u64,

    /// Backoff shape
    pub backoff: BackoffType,

    /// Randomize each delay between zero and its computed value
    pub jitter: bool,

    /// Per-send timeout
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            base_delay_ms: 1000,
            max_delay_ms: 32_000,
            backoff: BackoffType::Constant,
            jitter: false,
            timeout_ms: 30_000,
        }
    }
}

// ============================================================================
// Pipeline Config
// ============================================================================

/// Engine configuration as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Writes issued concurrently per chunk
    pub batch_size: usize,

    /// Maximum pages per run
    pub page_ceiling: u32,

    /// Maximum concurrent enrichment lookups
    pub concurrency: usize,

    /// History ordering policy
    pub history_order: HistoryOrder,

    /// Resolve without writing
    pub dry_run: bool,

    /// Drop updates that match the current owner
    pub skip_unchanged: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            batch_size: sync.batch_size,
            page_ceiling: sync.page_ceiling,
            concurrency: sync.concurrency,
            history_order: sync.history_order,
            dry_run: sync.dry_run,
            skip_unchanged: sync.skip_unchanged,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl SyncSettings {
    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).none_if_empty() {
            debug!("Base URL overridden from {BASE_URL_ENV}");
            self.api.base_url = url;
        }
        self
    }

    /// Check settings for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::missing_field("api.base_url"));
        }
        url::Url::parse(&self.api.base_url)?;

        if self.search.filters.is_empty() {
            return Err(Error::invalid_value(
                "search.filters",
                "at least one filter is required",
            ));
        }
        if self.search.page_size == 0 {
            return Err(Error::invalid_value("search.page_size", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_value("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::invalid_value(
                "retry.base_delay_ms",
                format!(
                    "{} exceeds retry.max_delay_ms ({})",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            ));
        }
        if self.pipeline.batch_size == 0 {
            return Err(Error::invalid_value("pipeline.batch_size", "must be at least 1"));
        }
        if self.pipeline.concurrency == 0 {
            return Err(Error::invalid_value("pipeline.concurrency", "must be at least 1"));
        }
        if let Some(limit) = &self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Transport configuration
    pub fn http_config(&self) -> HttpClientConfig {
        let retry = &self.retry;
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api.base_url)
            .timeout(Duration::from_millis(retry.timeout_ms))
            .max_attempts(retry.max_attempts)
            .backoff(
                retry.backoff,
                Duration::from_millis(retry.base_delay_ms),
                Duration::from_millis(retry.max_delay_ms),
            )
            .jitter(retry.jitter);

        builder = match &self.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        builder.build()
    }

    /// Search to run, requesting the owner and creation properties the
    /// pipeline reads
    pub fn search_spec(&self) -> SearchSpec {
        self.search.clone().with_properties([
            self.api.owner_property.as_str(),
            self.api.created_property.as_str(),
        ])
    }

    /// Engine configuration
    pub fn sync_config(&self) -> SyncConfig {
        let p = &self.pipeline;
        SyncConfig::new()
            .with_batch_size(p.batch_size)
            .with_page_ceiling(p.page_ceiling)
            .with_concurrency(p.concurrency)
            .with_history_order(p.history_order)
            .with_dry_run(p.dry_run)
            .with_skip_unchanged(p.skip_unchanged)
    }
}

/// Credential from an explicit token or the environment; none means no
/// Authorization header is sent
pub fn resolve_auth(explicit: Option<String>) -> AuthConfig {
    resolve_auth_from(explicit, |key| std::env::var(key).ok())
}

/// `resolve_auth` with a custom variable lookup
pub fn resolve_auth_from(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> AuthConfig {
    let token = explicit
        .none_if_empty()
        .or_else(|| lookup(TOKEN_ENV).none_if_empty());
    AuthConfig::bearer_or_none(token)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let settings = SyncSettings::from_yaml("").unwrap();
        assert_eq!(settings.api.base_url, "https://api.hubapi.com");
        assert_eq!(settings.search.page_size, 100);
        assert_eq!(settings.retry.max_attempts, 60);
        assert_eq!(settings.retry.backoff, BackoffType::Constant);
        assert_eq!(settings.pipeline.batch_size, 100);
        assert!(settings.rate_limit.is_none());
        assert_ok!(settings.validate());
    }

    #[test]
    fn test_default_search_is_filtered() {
        let settings = SyncSettings::from_yaml("api:\n  base_url: http://localhost\n").unwrap();
        let body = settings.search_spec().to_body(None);

        let filters = body["filterGroups"][0]["filters"].as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0]["propertyName"], "createdate");
        assert_eq!(filters[0]["operator"], "BETWEEN");
        assert_eq!(filters[0]["value"], "2021-01-04T00:00:00Z");
        assert_eq!(filters[0]["highValue"], "2021-01-15T23:59:59Z");
        assert_eq!(filters[1]["propertyName"], "pipeline");
        assert_eq!(filters[1]["value"], "8214425");
        assert_eq!(
            body["properties"],
            serde_json::json!(["hubspot_owner_id", "createdate"])
        );
    }

    #[test]
    fn test_search_spec_requests_configured_properties() {
        let yaml = "api:\n  owner_property: owner_id\n  created_property: created_at\nsearch:\n  properties: [amount]\n";
        let settings = SyncSettings::from_yaml(yaml).unwrap();
        assert_eq!(
            settings.search_spec().properties,
            vec!["amount", "owner_id", "created_at"]
        );
    }

    #[test]
    fn test_empty_filters_are_rejected() {
        let settings = SyncSettings::from_yaml("search:\n  filters: []\n").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfigValue { ref field, .. }) if field == "search.filters"
        ));
    }

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
api:
  base_url: https://crm.example.com
  owner_property: owner_id
search:
  filters:
    - property: createdate
      operator: BETWEEN
      value: "2021-01-04T00:00:00Z"
      high_value: "2021-01-15T23:59:59Z"
    - property: pipeline
      operator: EQ
      value: "8214425"
  properties: [owner_id, createdate]
  page_size: 50
retry:
  max_retries: 5
  base_delay_ms: 200
  max_delay_ms: 5000
  backoff: exponential
  jitter: true
pipeline:
  batch_size: 20
  concurrency: 4
  history_order: sort_ascending
  dry_run: true
rate_limit:
  requests_per_second: 9
"#;
        let settings = SyncSettings::from_yaml(yaml).unwrap();

        assert_eq!(settings.api.base_url, "https://crm.example.com");
        assert_eq!(settings.api.owner_property, "owner_id");
        assert_eq!(settings.api.created_property, "createdate");
        assert_eq!(settings.search.filters.len(), 2);
        assert_eq!(
            settings.search.filters[0].high_value,
            Some("2021-01-15T23:59:59Z".into())
        );
        assert_eq!(settings.search.page_size, 50);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.backoff, BackoffType::Exponential);
        assert_eq!(settings.retry.timeout_ms, 30_000);
        assert_eq!(settings.pipeline.page_ceiling, 100);
        assert_eq!(settings.pipeline.history_order, HistoryOrder::SortAscending);
        assert_eq!(
            settings.rate_limit,
            Some(RateLimiterConfig::new(9, 10))
        );

        let http = settings.http_config();
        assert_eq!(http.base_url.as_deref(), Some("https://crm.example.com"));
        assert_eq!(http.max_attempts, 5);
        assert_eq!(http.initial_backoff, Duration::from_millis(200));
        assert_eq!(http.max_backoff, Duration::from_secs(5));
        assert!(http.jitter);
        assert!(http.rate_limit.is_some());

        let sync = settings.sync_config();
        assert_eq!(sync.batch_size, 20);
        assert_eq!(sync.concurrency, 4);
        assert!(sync.dry_run);
    }

    #[test]
    fn test_example_settings_file() {
        let settings =
            SyncSettings::from_yaml(include_str!("../config/owner-sync.example.yaml")).unwrap();
        assert_ok!(settings.validate());

        let defaults = SyncSettings::default();
        assert_eq!(settings.api, defaults.api);
        assert_eq!(settings.search.filters.len(), 2);
        assert_eq!(settings.retry.max_attempts, defaults.retry.max_attempts);
        assert_eq!(settings.pipeline.batch_size, defaults.pipeline.batch_size);
        assert!(settings.rate_limit.is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SyncSettings::from_yaml("retry: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipeline:\n  batch_size: 7").unwrap();

        let settings = SyncSettings::load(file.path()).unwrap();
        assert_eq!(settings.pipeline.batch_size, 7);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncSettings::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_base_url_override() {
        let settings = SyncSettings::default().with_overrides_from(|key| {
            (key == BASE_URL_ENV).then(|| "http://127.0.0.1:9000".to_string())
        });
        assert_eq!(settings.api.base_url, "http://127.0.0.1:9000");

        let settings = SyncSettings::default().with_overrides_from(|_| Some(String::new()));
        assert_eq!(settings.api.base_url, "https://api.hubapi.com");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = SyncSettings::default();
        settings.pipeline.batch_size = 0;
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfigValue { ref field, .. }) if field == "pipeline.batch_size"
        ));

        let mut settings = SyncSettings::default();
        settings.search.page_size = 0;
        assert_err!(settings.validate());

        let mut settings = SyncSettings::default();
        settings.retry.max_attempts = 0;
        assert_err!(settings.validate());

        let mut settings = SyncSettings::default();
        settings.pipeline.concurrency = 0;
        assert_err!(settings.validate());

        let mut settings = SyncSettings::default();
        settings.retry.base_delay_ms = 40_000;
        assert_err!(settings.validate());

        let mut settings = SyncSettings::default();
        settings.rate_limit = Some(RateLimiterConfig::new(0, 1));
        assert_err!(settings.validate());

        let mut settings = SyncSettings::default();
        settings.api.base_url = "not a url".to_string();
        assert!(matches!(settings.validate(), Err(Error::InvalidUrl(_))));

        let mut settings = SyncSettings::default();
        settings.api.base_url = String::new();
        assert!(matches!(
            settings.validate(),
            Err(Error::MissingConfigField { .. })
        ));
    }

    #[test]
    fn test_resolve_auth() {
        let auth = resolve_auth_from(Some("cli".to_string()), |_| Some("env".to_string()));
        assert!(matches!(auth, AuthConfig::Bearer { ref token } if token == "cli"));

        let auth = resolve_auth_from(None, |key| {
            (key == TOKEN_ENV).then(|| "env".to_string())
        });
        assert!(matches!(auth, AuthConfig::Bearer { ref token } if token == "env"));

        let auth = resolve_auth_from(Some(String::new()), |_| None);
        assert!(auth.is_none());
    }
}
