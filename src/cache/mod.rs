//! Namespaced key/value cache with per-entry expiry.
//!
//! Entries are stored through a [`CacheBackend`] as JSON of the form
//! `{"value": ..., "expiry": <unix ms>}` under keys prefixed with
//! [`CACHE_KEY_PREFIX`]. Reads never fail: an expired or undecodable entry is
//! evicted and reported as a miss.

mod backend;
mod clock;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};

/// Prefix owned by this cache; `clear_all` never touches other keys.
pub const CACHE_KEY_PREFIX: &str = "channel_tag_manager_";

/// Cache key for the record collection.
pub const RECORDS_KEY: &str = "channels";

/// Cache key for the tag directory.
pub const TAGS_KEY: &str = "tags";

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    expiry: i64,
}

/// TTL cache over a pluggable persistence backend.
///
/// Cloning is cheap and clones share the same backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            backend,
            clock,
            default_ttl,
        }
    }

    /// In-memory cache on the system clock.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
            default_ttl,
        )
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn storage_key(key: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{key}")
    }

    /// Read a live entry. Expired or corrupt entries are evicted and read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = Self::storage_key(key);
        let raw = self.backend.get_item(&storage_key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Evicting undecodable cache entry '{key}': {e}");
                self.backend.remove_item(&storage_key);
                return None;
            }
        };

        if self.clock.now_ms() > entry.expiry {
            tracing::debug!("Cache entry '{key}' expired");
            self.backend.remove_item(&storage_key);
            return None;
        }

        tracing::debug!("Cache hit for '{key}'");
        Some(entry.value)
    }

    /// Store `value` with the default TTL.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` for `ttl`. Write failures are logged and otherwise ignored.
    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expiry: self.clock.now_ms().saturating_add(ttl.as_millis() as i64),
        };

        let result = serde_json::to_string(&entry)
            .map_err(Into::into)
            .and_then(|json| self.backend.set_item(&Self::storage_key(key), json));

        if let Err(e) = result {
            tracing::warn!("Cache save failed for '{key}': {e}");
        }
    }

    /// Remove every entry under this cache's prefix.
    pub fn clear_all(&self) {
        let owned: Vec<String> = self
            .backend
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(CACHE_KEY_PREFIX))
            .collect();

        tracing::debug!("Clearing {} cache entries", owned.len());
        for key in owned {
            self.backend.remove_item(&key);
        }
    }

    /// Unprefixed keys currently stored, live or not.
    pub fn entries(&self) -> Vec<String> {
        self.backend
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(CACHE_KEY_PREFIX).map(str::to_string))
            .collect()
    }
}
