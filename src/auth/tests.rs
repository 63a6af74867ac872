//! Tests for the auth module

use super::*;
use std::collections::HashMap;

fn build(auth: &Authenticator) -> reqwest::Request {
    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    auth.apply(req).build().unwrap()
}

#[test]
fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let built = build(&auth);
    assert!(built.headers().get("Authorization").is_none());
}

#[test]
fn test_bearer_auth() {
    let auth = Authenticator::new(AuthConfig::Bearer {
        token: "pat-123".to_string(),
    });
    let built = build(&auth);
    assert_eq!(built.headers().get("Authorization").unwrap(), "Bearer pat-123");
}

#[test]
fn test_api_key_header_with_prefix() {
    let auth = Authenticator::new(AuthConfig::ApiKey {
        header_name: "X-API-Key".to_string(),
        prefix: Some("Token ".to_string()),
        value: "k1".to_string(),
    });
    let built = build(&auth);
    assert_eq!(built.headers().get("X-API-Key").unwrap(), "Token k1");
}

#[test]
fn test_custom_headers() {
    let mut headers = HashMap::new();
    headers.insert("X-Tenant".to_string(), "acme".to_string());
    let auth = Authenticator::new(AuthConfig::CustomHeaders { headers });
    let built = build(&auth);
    assert_eq!(built.headers().get("X-Tenant").unwrap(), "acme");
}

#[test]
fn test_bearer_or_none() {
    assert!(AuthConfig::bearer_or_none(None).is_none());
    assert!(AuthConfig::bearer_or_none(Some("  ".to_string())).is_none());

    match AuthConfig::bearer_or_none(Some(" tok \n".to_string())) {
        AuthConfig::Bearer { token } => assert_eq!(token, "tok"),
        other => panic!("Expected Bearer, got {other:?}"),
    }
}

#[test]
fn test_debug_hides_secret() {
    let auth = Authenticator::new(AuthConfig::Bearer {
        token: "super-secret".to_string(),
    });
    let debug = format!("{auth:?}");
    assert!(debug.contains("bearer"));
    assert!(!debug.contains("super-secret"));
}
