//! Pre-configured HTTP client for the Station API.
//!
//! Every outgoing call is wrapped by the installed interceptor chain:
//! bearer injection from the stored token before send, and a 401 diagnostic
//! after receipt. The client holds no per-request state; each call is an
//! independent async operation bounded only by the fixed timeout.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::TokenStore;
use crate::config::Config;

use super::interceptor::{AuthFailureLog, BearerAuth, Interceptor};
use super::ApiError;

/// HTTP request timeout in seconds.
/// On timeout the operation fails and is reported like any transport error.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default content type for general requests.
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Shared request client for the Station API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ApiClient {
    /// Create a client with the default interceptor chain: bearer injection
    /// from the given token store, then 401 diagnostics.
    pub fn new(config: &Config, store: TokenStore) -> Result<Self, ApiError> {
        Self::with_interceptors(
            config,
            vec![Arc::new(BearerAuth::new(store)), Arc::new(AuthFailureLog)],
        )
    }

    /// Create a client with an explicit interceptor chain, applied in order.
    pub fn with_interceptors(
        config: &Config,
        interceptors: Vec<Arc<dyn Interceptor>>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            interceptors,
        })
    }

    /// Join a request path onto the base address.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send GET to the given path.
    pub async fn get(&self, path: &str) -> Result<Response, ApiError> {
        self.send(self.client.get(self.url(path))).await
    }

    /// Send POST with a JSON body to the given path.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    /// Send PUT with a JSON body to the given path.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    /// Send DELETE to the given path.
    pub async fn delete(&self, path: &str) -> Result<Response, ApiError> {
        self.send(self.client.delete(self.url(path))).await
    }

    /// GET the given path and decode the response body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::decode(self.get(path).await?).await
    }

    /// POST a JSON body to the given path and decode the response as JSON.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::decode(self.post(path, body).await?).await
    }

    /// Run the interceptor chain around a single transport call.
    ///
    /// Pre-send hooks run in order and may reject the request; post-receive
    /// hooks observe the status (or its absence) and the original outcome is
    /// then propagated unchanged.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut headers = HeaderMap::new();
        for interceptor in &self.interceptors {
            interceptor.before_send(&mut headers)?;
        }

        let request = builder.headers(headers).build()?;
        debug!(method = %request.method(), url = %request.url(), "sending request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(status = %status, "received response");
                for interceptor in &self.interceptors {
                    interceptor.after_receive(Some(status));
                }
                Ok(response)
            }
            Err(e) => {
                debug!(error = %e, "request failed");
                for interceptor in &self.interceptors {
                    interceptor.after_receive(None);
                }
                Err(ApiError::Network(e))
            }
        }
    }

    /// Turn a response into typed JSON, classifying non-success statuses.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
