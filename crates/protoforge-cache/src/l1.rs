//! In-memory LRU tier with a uniform TTL.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use protoforge_types::{CacheKey, CompilationResult};

struct Entry {
    result: CompilationResult,
    inserted_at: Instant,
}

/// Thread-safe LRU cache of compilation results, each entry expiring after a
/// uniform TTL regardless of access recency.
pub struct L1Cache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl L1Cache {
    /// `max_bytes` and `estimated_entry_bytes` translate a byte budget into
    /// an entry-count capacity, since `lru::LruCache` is capacity-bounded by
    /// entry count, not by tracked byte size.
    pub fn new(max_bytes: u64, estimated_entry_bytes: u64, ttl: Duration) -> Self {
        let estimated_entry_bytes = estimated_entry_bytes.max(1);
        let capacity = (max_bytes / estimated_entry_bytes).max(1) as usize;
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CompilationResult> {
        let key = key.to_string();
        let mut inner = self.inner.lock().expect("l1 cache lock poisoned");
        match inner.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.result.clone()),
            Some(_) => {
                inner.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &CacheKey, result: CompilationResult) {
        let mut inner = self.inner.lock().expect("l1 cache lock poisoned");
        inner.put(
            key.to_string(),
            Entry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn delete(&self, key: &CacheKey) {
        let mut inner = self.inner.lock().expect("l1 cache lock poisoned");
        inner.pop(&key.to_string());
    }

    /// L1 has no prefix index, so invalidating "everything for this
    /// module/version" means dropping the whole tier.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("l1 cache lock poisoned");
        inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("l1 cache lock poisoned").len()
    }
}
