#![allow(clippy::unwrap_used)]
// Integration tests for `TokenSession` against a mock token endpoint.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aerolite_api::{Error, OAuthConfig, PkcePair, TokenSession};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TokenSession) {
    let server = MockServer::start().await;
    let config = OAuthConfig {
        token_url: Url::parse(&format!("{}/oauth/token", server.uri())).unwrap(),
        ..OAuthConfig::default()
    };
    let session = TokenSession::from_refresh_token(
        config,
        reqwest::Client::new(),
        SecretString::from("refresh-1".to_string()),
    );
    (server, session)
}

// ── Refresh tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_on_first_use() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-2",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = session.ensure_token_valid().await.unwrap();
    assert_eq!(token.expose_secret(), "access-1");

    // Rotated refresh token is kept for the next cycle.
    let stored = session.token_set().await.unwrap();
    assert_eq!(stored.refresh_token.expose_secret(), "refresh-2");

    // A second call within the token lifetime does not hit the endpoint
    // again (the mock's expect(1) enforces this on drop).
    let again = session.ensure_token_valid().await.unwrap();
    assert_eq!(again.expose_secret(), "access-1");
}

#[tokio::test]
async fn test_refresh_keeps_previous_token_when_not_rotated() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 60
        })))
        .mount(&server)
        .await;

    session.ensure_token_valid().await.unwrap();

    let stored = session.token_set().await.unwrap();
    assert_eq!(stored.refresh_token.expose_secret(), "refresh-1");
}

#[tokio::test]
async fn test_rejected_refresh_is_authorization_expired() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let err = session.ensure_token_valid().await.unwrap_err();

    assert!(
        matches!(err, Error::AuthorizationExpired),
        "expected AuthorizationExpired, got: {err:?}"
    );
    assert!(err.is_auth_expired());

    // Failure does not discard the stored refresh token.
    assert!(session.token_set().await.is_some());
}

#[tokio::test]
async fn test_token_endpoint_5xx_is_not_auth_expired() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = session.ensure_token_valid().await.unwrap_err();

    assert!(matches!(err, Error::TokenEndpoint { status: 500, .. }));
    assert!(!err.is_auth_expired());
}

// ── Code exchange ───────────────────────────────────────────────────

#[tokio::test]
async fn test_exchange_code_sends_verifier() {
    let (server, session) = setup().await;
    let pkce = PkcePair::generate();

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-9",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let tokens = session.exchange_code("auth-code-1", &pkce).await.unwrap();
    assert_eq!(tokens.access_token.expose_secret(), "access-1");
    assert_eq!(tokens.refresh_token.expose_secret(), "refresh-9");
}
