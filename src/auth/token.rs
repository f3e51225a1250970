//! OAuth2 password-grant token acquisition.
//!
//! This module provides the `AuthClient` struct for exchanging user
//! credentials against the Station authorization server. Acquisition and
//! persistence are separate steps: `acquire` only performs the network
//! exchange, the caller decides whether to store the resulting token.

use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Base address of the Station authorization server.
const AUTH_BASE_URL: &str = "https://aevatar-station-ui-staging.aevatar.ai";

/// Token endpoint path on the authorization server.
const TOKEN_ENDPOINT: &str = "/connect/token";

/// Fixed OAuth2 client identifier for the Station UI.
const CLIENT_ID: &str = "AevatarAuthServer";

/// Fixed scope requested with every password grant.
const TOKEN_SCOPE: &str = "Aevatar offline_access";

/// Timeout for the token exchange in seconds.
const AUTH_TIMEOUT_SECS: u64 = 10;

/// Token returned by the authorization server on a successful exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer token. The only field callers usually persist.
    pub access_token: String,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// Lifetime in seconds as reported by the server.
    pub expires_in: u64,
    /// Scope actually granted.
    pub scope: String,
}

/// OAuth2 error document returned on a rejected exchange.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Errors raised by token acquisition.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The authorization server rejected the exchange. The message carries
    /// the server's `error_description` when one was supplied.
    #[error("authentication failed: {message}")]
    Rejected { message: String },

    /// The exchange never produced a usable response (timeout, connection
    /// refused, TLS failure).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered 2xx but the body did not match the token shape.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Client for the authorization server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a client against the fixed Station authorization server.
    pub fn new() -> Result<Self, AuthError> {
        Self::with_base_url(AUTH_BASE_URL)
    }

    /// Create a client against a specific authorization server address.
    /// Used by tests to point at a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(AUTH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Exchange a username/password pair for an access token.
    ///
    /// Issues a form-encoded password-grant POST to the token endpoint. No
    /// format validation is performed locally; malformed input is rejected
    /// by the server. The token is returned to the caller and not persisted
    /// here. No retry is attempted.
    pub async fn acquire(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        debug!(url = %url, username = %username, "requesting access token");

        let params = [
            ("grant_type", "password"),
            ("scope", TOKEN_SCOPE),
            ("username", username),
            ("password", password),
            ("client_id", CLIENT_ID),
        ];

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorBody>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("token request failed with status {}", status));
            return Err(AuthError::Rejected { message });
        }

        debug!(status = %status, "token exchange succeeded");

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}
