//! Request client module: the shared HTTP client and its interceptors.

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{AuthFailureLog, BearerAuth, Interceptor};
