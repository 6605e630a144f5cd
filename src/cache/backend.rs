//! Persistence backends for the cache store.
//!
//! A backend is a flat string-to-string map, modelled on browser local storage.
//! The cache store owns the key namespace and the entry encoding; backends only
//! move strings around.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

/// Key/value persistence used underneath [`super::CacheStore`].
pub trait CacheBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String) -> Result<()>;
    fn remove_item(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.lock().keys().cloned().collect()
    }
}

/// Backend persisted as one JSON object file, so entries survive between
/// CLI invocations.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file. A missing or unreadable file is an empty map.
    fn read_map(&self) -> BTreeMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable cache file {}: {e}", self.path.display());
            BTreeMap::new()
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(map)?)?;
        Ok(())
    }
}

impl CacheBackend for FileBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.read_map().remove(key)
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map();
        map.insert(key.to_string(), value);
        self.write_map(&map)
    }

    fn remove_item(&self, key: &str) {
        let _guard = self.lock.lock();
        let mut map = self.read_map();
        if map.remove(key).is_some()
            && let Err(e) = self.write_map(&map)
        {
            tracing::warn!("Failed to remove cache entry '{key}': {e}");
        }
    }

    fn keys(&self) -> Vec<String> {
        let _guard = self.lock.lock();
        self.read_map().into_keys().collect()
    }
}
