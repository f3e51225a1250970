//! Client configuration.
//!
//! The request client targets a configurable base address read once from the
//! environment at startup. A `.env` file is honoured when present so local
//! development does not need exported variables.

/// Environment variable holding the API base address.
const BASE_URL_ENV: &str = "API_BASE_URL";

/// Fallback base address when `API_BASE_URL` is not set.
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the general-purpose request client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base address all request paths are joined onto.
    pub base_url: String,
}

impl Config {
    /// Build a configuration with an explicit base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Reads `API_BASE_URL`, falling back to `http://localhost:3000` when
    /// absent. A `.env` file in the working directory is loaded first if one
    /// exists (silently ignored if not found).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            base_url: resolve_base_url(std::env::var(BASE_URL_ENV).ok()),
        }
    }
}

/// Pick the configured base address, falling back to the default.
fn resolve_base_url(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
