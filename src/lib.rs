// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # owner-sync
//!
//! Re-attributes the owner of CRM records from the owner history of a
//! related entity, as it stood when each record was created.
//!
//! ## Features
//!
//! - **Resilient transport**: bounded retries, server `Retry-After` hints,
//!   capped backoff, per-request timeouts, optional rate limiting
//! - **Cursor pagination**: lazy page sequence with a page ceiling
//! - **Enrichment fan-out**: bounded, order-preserving concurrent lookups
//! - **Temporal attribution**: picks the owner whose interval contains the
//!   record's creation instant
//! - **Batch writes**: chunked writes with per-record outcomes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use owner_sync::config::{resolve_auth, SyncSettings};
//! use owner_sync::engine::SyncEngine;
//! use owner_sync::http::HttpClient;
//! use owner_sync::remote::RestRecordApi;
//!
//! #[tokio::main]
//! async fn main() -> owner_sync::Result<()> {
//!     let settings = SyncSettings::load("owner-sync.yaml")?.with_env_overrides();
//!     settings.validate()?;
//!
//!     let client = HttpClient::with_auth(settings.http_config(), resolve_auth(None))?;
//!     let api = RestRecordApi::new(client, settings.api.clone());
//!
//!     let report = SyncEngine::new(&api)
//!         .with_config(settings.sync_config())
//!         .run(&settings.search_spec())
//!         .await;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          SyncEngine                           │
//! │   fetch page → enrich → resolve → write → advance cursor      │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬────────────┬─────────┐
//! │   Pager    │  Enricher   │  Resolver   │  Writer    │ Remote  │
//! ├────────────┼─────────────┼─────────────┼────────────┼─────────┤
//! │ Cursor     │ Association │ Half-open   │ Chunks     │ Search  │
//! │ Ceiling    │ Detail      │ intervals   │ Outcomes   │ Patch   │
//! └────────────┴─────────────┴─────────────┴────────────┴─────────┘
//!                                │
//!                  HttpClient (retry, backoff, rate limit)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Remote record API and its REST implementation
pub mod remote;

/// Template interpolation
pub mod template;

/// Cursor pagination
pub mod pagination;

/// Enrichment fan-out
pub mod enrich;

/// Owner attribution from history
pub mod attribution;

/// Batch writer
pub mod writer;

/// Main execution engine
pub mod engine;

/// Settings loading and validation
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;
