//! Store registry.
//!
//! Selects the `CacheStore` backing each cache group. Populated at startup;
//! groups without an explicit registration fall back to the default store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::store::CacheStore;

/// Maps group names to the store instance that holds them.
#[derive(Clone)]
pub struct StoreRegistry {
    default_store: Arc<dyn CacheStore>,
    by_group: HashMap<String, Arc<dyn CacheStore>>,
}

impl StoreRegistry {
    /// Create a registry whose wildcard and unregistered groups use `default_store`.
    pub fn new(default_store: Arc<dyn CacheStore>) -> Self {
        Self {
            default_store,
            by_group: HashMap::new(),
        }
    }

    /// Route `group` to `store`. A later registration replaces an earlier one.
    pub fn register(&mut self, group: impl Into<String>, store: Arc<dyn CacheStore>) {
        self.by_group.insert(group.into(), store);
    }

    pub fn with_group(mut self, group: impl Into<String>, store: Arc<dyn CacheStore>) -> Self {
        self.register(group, store);
        self
    }

    /// Store for `group`; the empty group is the default store.
    pub fn store_for(&self, group: &str) -> Arc<dyn CacheStore> {
        self.by_group
            .get(group)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_store))
    }

    pub fn default_store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.default_store)
    }

    /// Get the number of explicitly registered groups.
    pub fn group_count(&self) -> usize {
        self.by_group.len()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: Vec<&String> = self.by_group.keys().collect();
        groups.sort();
        f.debug_struct("StoreRegistry")
            .field("groups", &groups)
            .finish()
    }
}
