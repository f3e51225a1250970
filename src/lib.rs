//! Client library for the Aevatar Station API.
//!
//! This crate provides the thin client-side plumbing a Station application
//! needs to talk to the API:
//!
//! - [`AuthClient`]: exchange user credentials for an OAuth2 password-grant
//!   access token
//! - [`TokenStore`]: persist that token in a single process-wide slot over a
//!   pluggable storage backend (file, OS keychain, or in-memory)
//! - [`ApiClient`]: a pre-configured HTTP client that attaches the stored
//!   token as a bearer header on every request and logs authentication
//!   failures
//!
//! Typical flow:
//!
//! ```no_run
//! use aevatar_client::{ApiClient, AuthClient, Config, TokenStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let auth = AuthClient::new()?;
//! let token = auth.acquire("user@example.com", "secret").await?;
//!
//! let store = TokenStore::file()?;
//! store.set_token(&token.access_token)?;
//!
//! let client = ApiClient::new(&Config::from_env(), store)?;
//! let response = client.get("/api/profile").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiClient, ApiError, AuthFailureLog, BearerAuth, Interceptor};
pub use auth::{
    AuthClient, AuthError, FileStorage, KeyringStorage, MemoryStorage, TokenResponse,
    TokenStorage, TokenStore,
};
pub use config::Config;
