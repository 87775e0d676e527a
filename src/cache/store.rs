//! Per-site content cache instance.
//!
//! A site context holds exactly one live [`SiteCache`]; warm-up may build a
//! second one privately before swapping it in.

use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use crate::infra::telemetry::{METRIC_CACHE_HIT, METRIC_CACHE_MISS};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// LRU-bounded key → content store scoped to one site.
pub struct SiteCache {
    generation: u64,
    entries: RwLock<LruCache<String, Bytes>>,
}

impl SiteCache {
    /// Create an empty cache with the given limits.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            entries: RwLock::new(LruCache::new(config.entry_limit_non_zero())),
        }
    }

    /// Process-unique identifier of this instance, increasing with creation order.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let value = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        if value.is_some() {
            counter!(METRIC_CACHE_HIT).increment(1);
        } else {
            counter!(METRIC_CACHE_MISS).increment(1);
        }
        value
    }

    pub fn contains(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains(key)
    }

    /// Store an entry, returning the key evicted to make room, if any.
    pub fn put(&self, key: impl Into<String>, value: Bytes) -> Option<String> {
        let key = key.into();
        rw_write(&self.entries, SOURCE, "put")
            .push(key.clone(), value)
            .and_then(|(evicted, _)| (evicted != key).then_some(evicted))
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    /// Maximum number of entries held before LRU eviction.
    pub fn capacity(&self) -> usize {
        rw_read(&self.entries, SOURCE, "capacity").cap().get()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SiteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCache")
            .field("generation", &self.generation)
            .field("len", &self.len())
            .finish()
    }
}
