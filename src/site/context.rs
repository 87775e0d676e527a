use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, MutexGuard};

use crate::cache::{CacheConfig, SiteCache};

use super::config::SiteConfig;

/// Runtime state of one logical site.
///
/// The live cache sits behind an [`ArcSwap`]: readers take a snapshot with
/// [`SiteContext::cache`] and keep using it even if a warm-up publishes a new
/// instance meanwhile. Only [`SiteContext::replace_cache`] mutates the slot.
pub struct SiteContext {
    site_name: String,
    fallback: bool,
    config: SiteConfig,
    cache_config: CacheConfig,
    cache: ArcSwap<SiteCache>,
    warm_gate: Mutex<()>,
}

impl SiteContext {
    pub fn new(
        site_name: impl Into<String>,
        fallback: bool,
        config: SiteConfig,
        cache_config: CacheConfig,
    ) -> Self {
        let cache = ArcSwap::from_pointee(SiteCache::new(&cache_config));
        Self {
            site_name: site_name.into(),
            fallback,
            config,
            cache_config,
            cache,
            warm_gate: Mutex::new(()),
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Whether this is the shared default context rather than a site-specific one.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Snapshot of the live cache.
    pub fn cache(&self) -> Arc<SiteCache> {
        self.cache.load_full()
    }

    /// Build an empty cache with this site's limits, not yet attached.
    pub fn new_cache(&self) -> SiteCache {
        SiteCache::new(&self.cache_config)
    }

    /// Atomically publish `cache` as the live cache, returning the previous one.
    pub fn replace_cache(&self, cache: Arc<SiteCache>) -> Arc<SiteCache> {
        self.cache.swap(cache)
    }

    /// Serializes warm-ups of this site; readers never take it.
    pub(crate) async fn lock_warm_up(&self) -> MutexGuard<'_, ()> {
        self.warm_gate.lock().await
    }
}

impl std::fmt::Debug for SiteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteContext")
            .field("site_name", &self.site_name)
            .field("fallback", &self.fallback)
            .field("cache_generation", &self.cache.load().generation())
            .finish()
    }
}
