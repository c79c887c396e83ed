//! Cache storage implementations.
//!
//! `CacheStore` is the string key/value contract the directory service relies
//! on. Deleting an absent key succeeds, which keeps invalidation sweeps free
//! of spurious failures.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;

use super::error::CacheError;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";
const METRIC_CACHE_EVICT: &str = "itemdir_cache_evict_total";

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, payload: String) -> Result<(), CacheError>;

    /// Removes `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Backend label for logs.
    fn backend(&self) -> &'static str;
}

/// In-process cache with LRU eviction.
pub struct LruCacheStore {
    entries: Mutex<LruCache<String, String>>,
}

impl LruCacheStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for LruCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(mutex_lock(&self.entries, SOURCE, "get").get(key).cloned())
    }

    async fn set(&self, key: &str, payload: String) -> Result<(), CacheError> {
        let evicted = mutex_lock(&self.entries, SOURCE, "set").push(key.to_string(), payload);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize) -> LruCacheStore {
        LruCacheStore::new(NonZeroUsize::new(capacity).expect("non-zero"))
    }

    #[tokio::test]
    async fn set_get_delete() {
        let store = store(4);
        assert_eq!(store.get("a").await.expect("get"), None);

        store.set("a", "1".to_string()).await.expect("set");
        assert_eq!(store.get("a").await.expect("get").as_deref(), Some("1"));

        store.set("a", "2".to_string()).await.expect("overwrite");
        assert_eq!(store.get("a").await.expect("get").as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.delete("a").await.expect("delete");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_of_absent_key_succeeds() {
        let store = store(4);
        store.delete("missing").await.expect("absent delete");
        store.delete("missing").await.expect("repeated delete");
    }

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let store = store(2);
        store.set("a", "1".to_string()).await.expect("set");
        store.set("b", "2".to_string()).await.expect("set");
        // Touch `a` so `b` becomes the eviction candidate.
        store.get("a").await.expect("get");
        store.set("c", "3".to_string()).await.expect("set");

        assert!(store.get("a").await.expect("get").is_some());
        assert!(store.get("b").await.expect("get").is_none());
        assert!(store.get("c").await.expect("get").is_some());
    }
}
