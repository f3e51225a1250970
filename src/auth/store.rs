//! Persistent token storage.
//!
//! The stored token lives in a single named slot (`auth_token`) inside a
//! process-wide key-value store. The store itself is abstracted behind the
//! small `TokenStorage` capability so the token service is testable without
//! a real persistent backend and portable across runtimes.
//!
//! Backends:
//! - `FileStorage`: one JSON document per key under a directory
//! - `KeyringStorage`: OS keychain entries
//! - `MemoryStorage`: in-process map, for tests and embedding
//!
//! The slot has no expiry-driven eviction: a stored token remains until it
//! is overwritten or explicitly removed, even past its actual expiry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage slot key for the access token.
const TOKEN_KEY: &str = "auth_token";

/// Keyring service name for `KeyringStorage` entries.
const SERVICE_NAME: &str = "aevatar-client";

/// Directory name under the platform cache directory for `FileStorage`.
const APP_DIR: &str = "aevatar-client";

/// Capability interface over a string key-value store.
pub trait TokenStorage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any existing one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// On-disk record for a single stored value.
/// `stored_at` is diagnostic only and never drives eviction.
#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    stored_at: DateTime<Utc>,
}

/// File-backed storage: one JSON document per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Create a store under the platform cache directory.
    pub fn in_cache_dir() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Self::new(cache_dir.join(APP_DIR))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry: {}", key))?;
        let stored: StoredValue = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse storage entry: {}", key))?;
        Ok(Some(stored.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let stored = StoredValue {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(self.entry_path(key), contents)
            .with_context(|| format!("Failed to write storage entry: {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry: {}", key))?;
        }
        Ok(())
    }
}

/// OS keychain storage. One keychain entry per key.
pub struct KeyringStorage;

impl KeyringStorage {
    fn entry(key: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")
    }
}

impl TokenStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read from keychain"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete keychain entry"),
        }
    }
}

/// In-process storage backed by a map. Not persistent.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Manages the single persisted token slot over a storage backend.
/// Clone is cheap - the backend is shared behind an Arc.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    /// Create a store over an explicit backend.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    /// File-backed store under the platform cache directory.
    pub fn file() -> Result<Self> {
        Ok(Self::new(Arc::new(FileStorage::in_cache_dir()?)))
    }

    /// Store backed by the OS keychain.
    pub fn keyring() -> Self {
        Self::new(Arc::new(KeyringStorage))
    }

    /// Non-persistent in-process store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Write the token into the slot, overwriting any existing value.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)
    }

    /// Read the currently stored token, `None` when the slot is empty.
    ///
    /// A backend failure is reported as an empty slot so that a request can
    /// still proceed unauthenticated; the failure itself is logged.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "token storage read failed");
                None
            }
        }
    }

    /// Remove the token slot. Idempotent.
    pub fn clear_token(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)
    }
}
