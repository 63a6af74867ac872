//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::remote::testing::FakeApi;
use crate::remote::{ApiConfig, Page, Record, RestRecordApi, SearchSpec};
use crate::types::BackoffType;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(ids: &[&str], next: Option<&str>) -> Page {
    Page::new(
        ids.iter().map(|id| Record::new(*id, None)).collect(),
        next.map(str::to_string),
    )
}

fn chained_api(pages: usize) -> FakeApi {
    let mut api = FakeApi::new();
    for i in 0..pages {
        let cursor = if i == 0 { None } else { Some(format!("c{i}")) };
        let next = if i + 1 < pages {
            Some(format!("c{}", i + 1))
        } else {
            None
        };
        let id = format!("r{i}");
        api = api.page(cursor.as_deref(), page(&[id.as_str()], next.as_deref()));
    }
    api
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.page, 0);
    assert!(state.cursor.is_none());
    assert_eq!(state.total_fetched, 0);
    assert!(!state.done);
    assert!(state.stop_reason.is_none());
}

#[test]
fn test_pagination_state_mutations() {
    let mut state = PaginationState::new();

    state.advance(100, Some("next".to_string()));
    assert_eq!(state.page, 1);
    assert_eq!(state.total_fetched, 100);
    assert_eq!(state.cursor, Some("next".to_string()));

    state.finish(StopReason::Exhausted);
    assert!(state.done);
    assert_eq!(state.stop_reason, Some(StopReason::Exhausted));
}

// ============================================================================
// Pager Tests
// ============================================================================

#[tokio::test]
async fn test_pager_follows_cursor_until_absent() {
    let api = chained_api(3);
    let spec = SearchSpec::default();
    let mut pager = Pager::new(&api, &spec, 100);

    let mut ids = Vec::new();
    while let Some(page) = pager.next_page().await.unwrap() {
        ids.extend(page.records.into_iter().map(|r| r.id));
    }

    assert_eq!(ids, vec!["r0", "r1", "r2"]);
    assert_eq!(
        api.search_calls(),
        vec![None, Some("c1".to_string()), Some("c2".to_string())]
    );
    assert_eq!(pager.state().page, 3);
    assert_eq!(pager.state().stop_reason, Some(StopReason::Exhausted));

    // Finished pagers stay finished.
    assert!(pager.next_page().await.unwrap().is_none());
    assert_eq!(api.search_calls().len(), 3);
}

#[tokio::test]
async fn test_pager_stops_at_ceiling() {
    let api = chained_api(10);
    let spec = SearchSpec::default();

    let outcome = fetch_all_pages(&api, &spec, 4).await;

    assert_eq!(outcome.pages.len(), 4);
    assert_eq!(api.search_calls().len(), 4);
    assert_eq!(outcome.stop_reason, Some(StopReason::PageCeiling));
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn test_pager_cursor_absence_wins_over_ceiling() {
    let api = chained_api(2);
    let spec = SearchSpec::default();

    let outcome = fetch_all_pages(&api, &spec, 2).await;

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.stop_reason, Some(StopReason::Exhausted));
}

#[tokio::test]
async fn test_pager_data_shape_is_soft_stop() {
    let api = FakeApi::new()
        .page(None, page(&["a", "b"], Some("c1")))
        .failing_page(Some("c1"), Error::data_shape("search response has no results array"));
    let spec = SearchSpec::default();

    let outcome = fetch_all_pages(&api, &spec, 100).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.stop_reason, Some(StopReason::DataShape));
    assert_eq!(api.search_calls().len(), 2);
}

#[tokio::test]
async fn test_pager_transport_failure_keeps_prefix() {
    let api = FakeApi::new()
        .page(None, page(&["a"], Some("c1")))
        .page(Some("c1"), page(&["b", "c"], Some("c2")))
        .failing_page(
            Some("c2"),
            Error::RetryExhausted {
                attempts: 60,
                last_status: Some(429),
            },
        );
    let spec = SearchSpec::default();

    let outcome = fetch_all_pages(&api, &spec, 100).await;

    assert!(!outcome.is_complete());
    assert!(matches!(
        outcome.error,
        Some(Error::RetryExhausted {
            last_status: Some(429),
            ..
        })
    ));
    let ids: Vec<_> = outcome.records().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(outcome.stop_reason, Some(StopReason::Failed));
}

#[tokio::test]
async fn test_pager_as_stream() {
    let api = FakeApi::new()
        .page(None, page(&["a"], Some("c1")))
        .failing_page(
            Some("c1"),
            Error::RetryExhausted {
                attempts: 2,
                last_status: Some(503),
            },
        );
    let spec = SearchSpec::default();

    let items: Vec<_> = Pager::new(&api, &spec, 100).into_stream().collect().await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}

#[tokio::test]
async fn test_pager_is_lazy() {
    let api = chained_api(3);
    let spec = SearchSpec::default();

    let stream = Pager::new(&api, &spec, 100).into_stream();
    assert!(api.search_calls().is_empty());

    let first: Vec<_> = stream.take(1).collect().await;
    assert_eq!(first.len(), 1);
    assert_eq!(api.search_calls().len(), 1);
}

#[tokio::test]
async fn test_pager_over_rest_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/deals/search"))
        .and(body_partial_json(json!({"after": "p2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "3"}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/deals/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "1"}, {"id": "2"}],
            "paging": {"next": {"after": "p2"}}
        })))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .backoff(BackoffType::Constant, Duration::ZERO, Duration::ZERO)
        .no_rate_limit()
        .build();
    let api = RestRecordApi::new(HttpClient::with_config(config).unwrap(), ApiConfig::default());
    let spec = SearchSpec::default();

    let outcome = fetch_all_pages(&api, &spec, 100).await;

    let ids: Vec<_> = outcome.records().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(outcome.stop_reason, Some(StopReason::Exhausted));
}
