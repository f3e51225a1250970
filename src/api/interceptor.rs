//! Request/response interceptors.
//!
//! An interceptor is an ordered pair of hooks applied around the base
//! transport call: `before_send` may edit the outgoing headers and can
//! reject the request, `after_receive` observes the response status (or its
//! absence on a transport failure) and must pass the outcome through
//! unchanged. The client applies installed interceptors in order on the way
//! out and on the way back.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::error;

use crate::auth::TokenStore;

use super::ApiError;

/// A (pre-send, post-receive) hook pair around the base transport call.
///
/// Both hooks default to no-ops so implementations only provide the side
/// they care about.
pub trait Interceptor: Send + Sync {
    /// Runs before every outgoing request. May edit headers; returning an
    /// error rejects the request without sending it. Must not perform
    /// network I/O.
    fn before_send(&self, headers: &mut HeaderMap) -> Result<(), ApiError> {
        let _ = headers;
        Ok(())
    }

    /// Runs after every response (`Some(status)`) or transport failure
    /// (`None`). Observes only; the original outcome always reaches the
    /// caller.
    fn after_receive(&self, status: Option<StatusCode>) {
        let _ = status;
    }
}

/// Injects `Authorization: Bearer <token>` from the stored token slot.
///
/// When the slot is empty the headers are left unchanged and the request
/// proceeds unauthenticated.
pub struct BearerAuth {
    store: TokenStore,
}

impl BearerAuth {
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }
}

impl Interceptor for BearerAuth {
    fn before_send(&self, headers: &mut HeaderMap) -> Result<(), ApiError> {
        if let Some(token) = self.store.token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }
}

/// Logs a diagnostic when a response comes back 401.
///
/// Side effect only: no logout, no retry, no redirect. Every other status
/// and every transport failure passes silently.
pub struct AuthFailureLog;

impl Interceptor for AuthFailureLog {
    fn after_receive(&self, status: Option<StatusCode>) {
        if status == Some(StatusCode::UNAUTHORIZED) {
            error!("authentication failed");
        }
    }
}
