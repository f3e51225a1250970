//! Authentication module: token acquisition and the persisted token slot.
//!
//! This module provides:
//! - `AuthClient`: OAuth2 password-grant exchange against the Station
//!   authorization server
//! - `TokenStore`: the single persisted `auth_token` slot over a pluggable
//!   storage backend
//!
//! Acquisition does not persist; callers store the returned token
//! explicitly.

pub mod store;
pub mod token;

pub use store::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage, TokenStore};
pub use token::{AuthClient, AuthError, TokenResponse};
