//! Cache store backends.
//!
//! `CacheStore` is the capability the executor evicts through. `MemoryStore`
//! is the bundled in-process backend; disk and distributed backends live in
//! the host and implement the same trait.

use std::sync::RwLock;

use bytes::Bytes;
use lru::LruCache;

use super::config::FlushConfig;
use super::error::StoreError;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Eviction capability of a page cache backend.
///
/// Every call is independently atomic and idempotent: deleting an absent key
/// returns `Ok(false)`, never an error.
pub trait CacheStore: Send + Sync {
    /// Remove one entry. Returns whether an entry was present.
    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError>;

    /// Remove every entry of `group`; the empty group means the whole store.
    fn flush(&self, group: &str) -> Result<bool, StoreError>;

    /// Extension tag for a pre-warming pass over `group`, if the backend
    /// supports one.
    fn ahead_generation_extension(&self, _group: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    /// Drop the entries superseded by the ahead-generation pass `extension`.
    fn flush_group_after_ahead_generation(
        &self,
        group: &str,
        _extension: &str,
    ) -> Result<(), StoreError> {
        self.flush(group).map(|_| ())
    }
}

/// A cached page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// In-memory page store keyed by `(group, key)` with LRU eviction.
pub struct MemoryStore {
    pages: RwLock<LruCache<(String, String), CachedPage>>,
}

impl MemoryStore {
    /// Create a new store with the given configuration.
    pub fn new(config: &FlushConfig) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(config.memory_store_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &str, group: &str) -> Option<CachedPage> {
        rw_write(&self.pages, SOURCE, "get")
            .get(&(group.to_string(), key.to_string()))
            .cloned()
    }

    /// Store a page. Returns the key evicted to make room, if any.
    pub fn set(&self, key: &str, group: &str, page: CachedPage) -> Option<(String, String)> {
        rw_write(&self.pages, SOURCE, "set")
            .push((group.to_string(), key.to_string()), page)
            .map(|(evicted, _)| evicted)
            .filter(|evicted| evicted.0 != group || evicted.1 != key)
    }

    pub fn contains(&self, key: &str, group: &str) -> bool {
        rw_read(&self.pages, SOURCE, "contains").contains(&(group.to_string(), key.to_string()))
    }

    /// Get the number of cached pages.
    pub fn len(&self) -> usize {
        rw_read(&self.pages, SOURCE, "len").len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError> {
        Ok(rw_write(&self.pages, SOURCE, "delete")
            .pop(&(group.to_string(), key.to_string()))
            .is_some())
    }

    fn flush(&self, group: &str) -> Result<bool, StoreError> {
        let mut pages = rw_write(&self.pages, SOURCE, "flush");
        if group.is_empty() {
            pages.clear();
            return Ok(true);
        }

        let doomed: Vec<(String, String)> = pages
            .iter()
            .filter(|((entry_group, _), _)| entry_group == group)
            .map(|(entry, _)| entry.clone())
            .collect();
        for entry in &doomed {
            pages.pop(entry);
        }
        Ok(true)
    }
}
