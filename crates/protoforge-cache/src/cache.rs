use std::future::Future;
use std::time::Duration;

use protoforge_types::{CacheKey, CompilationResult};
use tracing::warn;

use crate::error::Result;
use crate::l1::L1Cache;
#[cfg(feature = "redis-backend")]
use crate::l2::L2Cache;
use crate::stats::{CacheStats, Counters, Tier};

/// What the orchestrator depends on. The two-tier [`Cache`] below is the
/// production implementation; tests inject an in-memory double instead.
pub trait CacheStore: Send + Sync + 'static {
    fn get(&self, key: &CacheKey) -> impl Future<Output = Option<CompilationResult>> + Send;
    fn set(&self, key: &CacheKey, result: CompilationResult) -> impl Future<Output = ()> + Send;
    fn invalidate(&self, module: &str, version: &str) -> impl Future<Output = ()> + Send;
    fn delete(&self, key: &CacheKey) -> impl Future<Output = ()> + Send;
    fn stats(&self) -> CacheStats;
}

/// Two-tier cache: an in-memory LRU (L1) in front of an optional networked
/// KV store (L2). Every operation here is advisory — a failure anywhere is
/// logged and treated as a miss (`get`) or a no-op (`set`/`delete`); only
/// tier *construction* can hard-fail, when L2 is enabled without an
/// address.
pub struct Cache {
    l1: L1Cache,
    #[cfg(feature = "redis-backend")]
    l2: Option<L2Cache>,
    counters: Counters,
}

impl Cache {
    pub fn new(l1: L1Cache) -> Self {
        Self {
            l1,
            #[cfg(feature = "redis-backend")]
            l2: None,
            counters: Counters::default(),
        }
    }

    #[cfg(feature = "redis-backend")]
    pub fn with_l2(mut self, l2: L2Cache) -> Self {
        self.l2 = Some(l2);
        self
    }

    pub fn builder(max_bytes: u64, estimated_entry_bytes: u64, ttl: Duration) -> Self {
        Self::new(L1Cache::new(max_bytes, estimated_entry_bytes, ttl))
    }
}

impl CacheStore for Cache {
    async fn get(&self, key: &CacheKey) -> Option<CompilationResult> {
        if let Some(result) = self.l1.get(key) {
            self.counters.record_hit(Tier::L1);
            return Some(result);
        }

        #[cfg(feature = "redis-backend")]
        if let Some(l2) = &self.l2 {
            match l2.get(key).await {
                Ok(Some(result)) => {
                    self.counters.record_hit(Tier::L2);
                    self.l1.set(key, result.clone());
                    return Some(result);
                }
                Ok(None) => {}
                Err(err) => warn!("L2 cache get failed, treating as miss: {err}"),
            }
        }

        self.counters.record_miss();
        None
    }

    async fn set(&self, key: &CacheKey, result: CompilationResult) {
        self.l1.set(key, result.clone());

        #[cfg(feature = "redis-backend")]
        if let Some(l2) = &self.l2 {
            if let Err(err) = l2.set(key, &result).await {
                warn!("L2 cache set failed: {err}");
            }
        }
    }

    async fn invalidate(&self, module: &str, version: &str) {
        // L1 has no prefix index; purge wholesale rather than partially.
        self.l1.clear();

        #[cfg(feature = "redis-backend")]
        if let Some(l2) = &self.l2 {
            if let Err(err) = l2.invalidate_prefix(module, version).await {
                warn!("L2 cache invalidate failed: {err}");
            }
        }
        #[cfg(not(feature = "redis-backend"))]
        let _ = (module, version);
    }

    async fn delete(&self, key: &CacheKey) {
        self.l1.delete(key);

        #[cfg(feature = "redis-backend")]
        if let Some(l2) = &self.l2 {
            if let Err(err) = l2.delete(key).await {
                warn!("L2 cache delete failed: {err}");
            }
        }
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// In-memory double used by orchestrator unit tests; never misses on a
/// previously-set key and never talks to redis.
#[derive(Default)]
pub struct InMemoryCache {
    inner: std::sync::Mutex<std::collections::HashMap<String, CompilationResult>>,
    counters: Counters,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<CompilationResult> {
        let result = self
            .inner
            .lock()
            .expect("in-memory cache lock poisoned")
            .get(&key.to_string())
            .cloned();
        match &result {
            Some(_) => self.counters.record_hit(Tier::L1),
            None => self.counters.record_miss(),
        }
        result
    }

    async fn set(&self, key: &CacheKey, result: CompilationResult) {
        self.inner
            .lock()
            .expect("in-memory cache lock poisoned")
            .insert(key.to_string(), result);
    }

    async fn invalidate(&self, _module: &str, _version: &str) {
        self.inner.lock().expect("in-memory cache lock poisoned").clear();
    }

    async fn delete(&self, key: &CacheKey) {
        self.inner
            .lock()
            .expect("in-memory cache lock poisoned")
            .remove(&key.to_string());
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn key() -> CacheKey {
        CacheKey::new("user", "1.0.0", "go", "v1", &[], &[], &BTreeMap::new()).unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn l1_only_cache_hits_and_misses() {
        let cache = Cache::builder(1024 * 1024, 1024, Duration::from_secs(60));
        let key = key();

        assert!(cache.get(&key).await.is_none());
        cache.set(&key, CompilationResult::failed("go", "placeholder")).await;
        assert!(cache.get(&key).await.is_some());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.l1_hits, 1);
    }

    #[test_log::test(tokio::test)]
    async fn invalidate_clears_l1() {
        let cache = Cache::builder(1024 * 1024, 1024, Duration::from_secs(60));
        let key = key();
        cache.set(&key, CompilationResult::failed("go", "placeholder")).await;
        cache.invalidate("user", "1.0.0").await;
        assert!(cache.get(&key).await.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn in_memory_double_never_misses_after_set() {
        let cache = InMemoryCache::new();
        let key = key();
        cache.set(&key, CompilationResult::failed("go", "placeholder")).await;
        assert!(cache.get(&key).await.is_some());
    }
}
