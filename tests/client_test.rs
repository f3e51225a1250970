// Integration tests for the auth flow and request client.
//
// These run against a local mock server so the full stack is exercised:
// form-encoded token exchange, error propagation, token slot semantics,
// bearer injection, and 401 observation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mockito::{Matcher, Server};
use reqwest::StatusCode;

use aevatar_client::{
    ApiClient, AuthClient, AuthError, AuthFailureLog, BearerAuth, Config, Interceptor, TokenStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Counts 401 observations so tests can assert exactly one diagnostic
/// per authentication failure.
struct UnauthorizedCounter {
    seen: AtomicUsize,
}

impl UnauthorizedCounter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: AtomicUsize::new(0),
        })
    }

    fn count(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

impl Interceptor for UnauthorizedCounter {
    fn after_receive(&self, status: Option<StatusCode>) {
        if status == Some(StatusCode::UNAUTHORIZED) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ==========================================================================
// Token acquisition
// ==========================================================================

#[tokio::test]
async fn test_acquire_returns_server_token_fields() {
    init_tracing();
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/connect/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_header("accept", "*/*")
        .match_header("accept-language", "zh-CN,zh;q=0.9,en;q=0.8")
        .match_header("cache-control", "no-cache")
        .match_header("pragma", "no-cache")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("scope".into(), "Aevatar offline_access".into()),
            Matcher::UrlEncoded("username".into(), "user@example.com".into()),
            Matcher::UrlEncoded("password".into(), "secret".into()),
            Matcher::UrlEncoded("client_id".into(), "AevatarAuthServer".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "Aevatar offline_access"
            }"#,
        )
        .create_async()
        .await;

    let auth = AuthClient::with_base_url(server.url()).expect("Failed to create auth client");
    let token = auth
        .acquire("user@example.com", "secret")
        .await
        .expect("Token exchange failed");

    assert_eq!(token.access_token, "tok-1");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 3600);
    assert_eq!(token.scope, "Aevatar offline_access");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_acquire_surfaces_server_error_description() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/connect/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "invalid_grant", "error_description": "bad credentials"}"#)
        .create_async()
        .await;

    let auth = AuthClient::with_base_url(server.url()).unwrap();
    let err = auth
        .acquire("user@example.com", "wrong")
        .await
        .expect_err("Exchange should have been rejected");

    match err {
        AuthError::Rejected { ref message } => assert!(message.contains("bad credentials")),
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_acquire_falls_back_to_status_without_description() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/connect/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let auth = AuthClient::with_base_url(server.url()).unwrap();
    let err = auth
        .acquire("user@example.com", "wrong")
        .await
        .expect_err("Exchange should have been rejected");

    match err {
        AuthError::Rejected { ref message } => assert!(message.contains("400")),
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_acquire_connection_failure_is_network_error() {
    // Nothing listens here
    let auth = AuthClient::with_base_url("http://127.0.0.1:1").unwrap();
    let err = auth
        .acquire("user@example.com", "secret")
        .await
        .expect_err("Exchange should have failed");
    assert!(matches!(err, AuthError::Network(_)));
}

// ==========================================================================
// Bearer injection
// ==========================================================================

#[tokio::test]
async fn test_request_carries_stored_bearer_token() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/api/profile")
        .match_header("authorization", "Bearer xyz")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "tester"}"#)
        .create_async()
        .await;

    let store = TokenStore::in_memory();
    store.set_token("xyz").unwrap();

    let client = ApiClient::new(&Config::new(server.url()), store).unwrap();
    let response = client.get("/api/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_without_token_has_no_auth_header() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/api/profile")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = ApiClient::new(&Config::new(server.url()), TokenStore::in_memory()).unwrap();
    let response = client.get("/api/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cleared_token_stops_being_sent() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/api/profile")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let store = TokenStore::in_memory();
    store.set_token("xyz").unwrap();
    store.clear_token().unwrap();

    let client = ApiClient::new(&Config::new(server.url()), store).unwrap();
    client.get("/api/profile").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_default_content_type_is_json() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/api/profile")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = ApiClient::new(&Config::new(server.url()), TokenStore::in_memory()).unwrap();
    client.get("/api/profile").await.unwrap();

    mock.assert_async().await;
}

// ==========================================================================
// Response observation
// ==========================================================================

#[tokio::test]
async fn test_401_passes_through_with_one_observation() {
    init_tracing();
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/api/profile")
        .with_status(401)
        .with_body(r#"{"error": "unauthorized"}"#)
        .create_async()
        .await;

    let counter = UnauthorizedCounter::new();
    let store = TokenStore::in_memory();
    store.set_token("stale").unwrap();

    let client = ApiClient::with_interceptors(
        &Config::new(server.url()),
        vec![
            Arc::new(BearerAuth::new(store)),
            Arc::new(AuthFailureLog),
            counter.clone(),
        ],
    )
    .unwrap();

    // The rejection reaches the caller unchanged, body included
    let response = client.get("/api/profile").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap();
    assert!(body.contains("unauthorized"));

    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn test_200_produces_no_observation() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/api/profile")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let counter = UnauthorizedCounter::new();
    let client = ApiClient::with_interceptors(
        &Config::new(server.url()),
        vec![Arc::new(AuthFailureLog), counter.clone()],
    )
    .unwrap();

    let response = client.get("/api/profile").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(counter.count(), 0);
}

// ==========================================================================
// JSON helpers
// ==========================================================================

#[tokio::test]
async fn test_get_json_decodes_body() {
    #[derive(serde::Deserialize)]
    struct Profile {
        name: String,
    }

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/profile")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "tester"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&Config::new(server.url()), TokenStore::in_memory()).unwrap();
    let profile: Profile = client.get_json("/api/profile").await.unwrap();
    assert_eq!(profile.name, "tester");
}

#[tokio::test]
async fn test_post_json_classifies_failure_status() {
    use aevatar_client::ApiError;

    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/items")
        .with_status(401)
        .with_body("denied")
        .create_async()
        .await;

    let client = ApiClient::new(&Config::new(server.url()), TokenStore::in_memory()).unwrap();
    let result: Result<serde_json::Value, ApiError> = client
        .post_json("/api/items", &serde_json::json!({"name": "thing"}))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

// ==========================================================================
// Full flow
// ==========================================================================

#[tokio::test]
async fn test_login_store_then_authenticated_request() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/connect/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"access_token": "flow-token", "token_type": "Bearer", "expires_in": 3600, "scope": "Aevatar offline_access"}"#,
        )
        .create_async()
        .await;

    let api_mock = server
        .mock("GET", "/api/profile")
        .match_header("authorization", "Bearer flow-token")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let auth = AuthClient::with_base_url(server.url()).unwrap();
    let token = auth.acquire("user@example.com", "secret").await.unwrap();

    let store = TokenStore::in_memory();
    store.set_token(&token.access_token).unwrap();

    let client = ApiClient::new(&Config::new(server.url()), store).unwrap();
    let response = client.get("/api/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    api_mock.assert_async().await;
}
