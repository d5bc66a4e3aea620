use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use serde_json::Value;
use tracing::debug;

/// Cached social network listing.
pub const SN_CACHE_KEY: &str = "elsewhere_sn_data";
/// Cached instant messenger listing.
pub const IM_CACHE_KEY: &str = "elsewhere_im_data";

/// Process-wide key/value cache. Deleting an absent key is a no-op.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn delete(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    fn delete(&self, key: &str) {
        let evicted = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        debug!(key, evicted, "cache delete");
    }
}
