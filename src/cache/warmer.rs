//! Site cache warm-up with optional hot swap.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::infra::telemetry::{METRIC_CACHE_SWAP, METRIC_CACHE_WARM_FAILED, METRIC_CACHE_WARM_MS};
use crate::site::SiteContext;

use super::{
    source::{ContentError, ContentSource},
    store::SiteCache,
};

#[derive(Debug, Error)]
pub enum CacheWarmError {
    #[error("failed to enumerate warm-up content for site `{site}`: {source}")]
    Enumerate {
        site: String,
        #[source]
        source: ContentError,
    },
    #[error("failed to load `{key}` for site `{site}`: {source}")]
    Load {
        site: String,
        key: String,
        #[source]
        source: ContentError,
    },
    #[error(
        "warm-up content of site `{site}` does not fit its cache ({capacity} entries), `{evicted}` was evicted"
    )]
    Overflow {
        site: String,
        capacity: usize,
        evicted: String,
    },
}

/// Outcome of a completed warm-up.
#[derive(Debug, Clone)]
pub struct WarmReport {
    pub site: String,
    pub switched: bool,
    /// Warmed entries still resident once the warm-up finished.
    pub warmed: usize,
    /// Warmed entries pushed out again by the cache's entry limit (in place only).
    pub evicted: usize,
    /// Keys that vanished between enumeration and loading.
    pub skipped: usize,
    /// Generation of the cache that now holds the warmed entries.
    pub generation: u64,
    pub elapsed: Duration,
}

/// Warms the cache of a site context.
#[async_trait]
pub trait SiteCacheWarmer: Send + Sync {
    /// Warm `context`. With `switch_cache`, a fresh cache is populated and only
    /// published once complete; otherwise the live cache is filled in place.
    async fn warm_up_cache(
        &self,
        context: &SiteContext,
        switch_cache: bool,
    ) -> Result<WarmReport, CacheWarmError>;
}

/// [`SiteCacheWarmer`] that fills caches from a [`ContentSource`].
#[derive(Clone)]
pub struct ContentCacheWarmer {
    source: Arc<dyn ContentSource>,
}

#[derive(Debug, Default)]
struct PopulateStats {
    warmed: usize,
    evicted: usize,
    skipped: usize,
}

impl ContentCacheWarmer {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// Fill `cache` from the source. With `require_complete`, evicting any entry
    /// written by this pass aborts the warm-up.
    async fn populate(
        &self,
        context: &SiteContext,
        cache: &SiteCache,
        require_complete: bool,
    ) -> Result<PopulateStats, CacheWarmError> {
        let site = context.site_name();
        let keys = self
            .source
            .keys(context)
            .await
            .map_err(|source| CacheWarmError::Enumerate {
                site: site.to_string(),
                source,
            })?;

        let mut stats = PopulateStats::default();
        let mut seen = HashSet::with_capacity(keys.len());
        let mut resident = HashSet::with_capacity(keys.len());

        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }

            match self.source.load(context, &key).await {
                Ok(Some(value)) => {
                    let evicted = cache.put(key.clone(), value);
                    resident.insert(key);
                    let Some(evicted) = evicted else {
                        continue;
                    };
                    if !resident.remove(&evicted) {
                        continue;
                    }
                    if require_complete {
                        return Err(CacheWarmError::Overflow {
                            site: site.to_string(),
                            capacity: cache.capacity(),
                            evicted,
                        });
                    }
                    stats.evicted += 1;
                }
                Ok(None) => {
                    warn!(
                        target: "lectern::cache_warmer",
                        site,
                        key = %key,
                        "skipping cache warm because content is no longer available"
                    );
                    stats.skipped += 1;
                }
                Err(source) => {
                    return Err(CacheWarmError::Load {
                        site: site.to_string(),
                        key,
                        source,
                    });
                }
            }
        }

        if stats.evicted > 0 {
            warn!(
                target: "lectern::cache_warmer",
                site,
                evicted = stats.evicted,
                capacity = cache.capacity(),
                "warm-up content exceeds the cache entry limit"
            );
        }
        stats.warmed = resident.len();
        Ok(stats)
    }

    async fn warm_switched(
        &self,
        context: &SiteContext,
    ) -> Result<(PopulateStats, u64), CacheWarmError> {
        // Populated privately; nobody can observe it until the swap below.
        let fresh = context.new_cache();
        let stats = self.populate(context, &fresh, true).await?;

        let fresh = Arc::new(fresh);
        let generation = fresh.generation();
        let previous = context.replace_cache(fresh);
        counter!(METRIC_CACHE_SWAP).increment(1);

        info!(
            target: "lectern::cache_warmer",
            site = context.site_name(),
            previous_generation = previous.generation(),
            generation,
            "live cache swapped"
        );
        Ok((stats, generation))
    }

    async fn warm_in_place(
        &self,
        context: &SiteContext,
    ) -> Result<(PopulateStats, u64), CacheWarmError> {
        let live = context.cache();
        let stats = self.populate(context, &live, false).await?;
        Ok((stats, live.generation()))
    }
}

#[async_trait]
impl SiteCacheWarmer for ContentCacheWarmer {
    async fn warm_up_cache(
        &self,
        context: &SiteContext,
        switch_cache: bool,
    ) -> Result<WarmReport, CacheWarmError> {
        let _gate = context.lock_warm_up().await;

        let mode = if switch_cache { "switch" } else { "in_place" };
        info!(
            target: "lectern::cache_warmer",
            site = context.site_name(),
            switch_cache,
            "warming site cache"
        );

        let started_at = Instant::now();
        let outcome = if switch_cache {
            self.warm_switched(context).await
        } else {
            self.warm_in_place(context).await
        };
        let elapsed = started_at.elapsed();
        histogram!(METRIC_CACHE_WARM_MS, "mode" => mode).record(elapsed.as_secs_f64() * 1000.0);

        match outcome {
            Ok((stats, generation)) => {
                info!(
                    target: "lectern::cache_warmer",
                    site = context.site_name(),
                    mode,
                    warmed = stats.warmed,
                    evicted = stats.evicted,
                    skipped = stats.skipped,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "site cache warmed"
                );
                Ok(WarmReport {
                    site: context.site_name().to_string(),
                    switched: switch_cache,
                    warmed: stats.warmed,
                    evicted: stats.evicted,
                    skipped: stats.skipped,
                    generation,
                    elapsed,
                })
            }
            Err(err) => {
                counter!(METRIC_CACHE_WARM_FAILED, "mode" => mode).increment(1);
                warn!(
                    target: "lectern::cache_warmer",
                    site = context.site_name(),
                    mode,
                    error = %err,
                    "site cache warm-up failed"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use crate::cache::CacheConfig;
    use crate::site::SiteConfig;

    use super::*;

    struct ListSource {
        entries: Vec<(&'static str, Option<&'static str>)>,
        fail_on: Option<&'static str>,
        loads: AtomicUsize,
    }

    impl ListSource {
        fn new(entries: Vec<(&'static str, Option<&'static str>)>) -> Self {
            Self {
                entries,
                fail_on: None,
                loads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentSource for ListSource {
        async fn keys(&self, _site: &SiteContext) -> Result<Vec<String>, ContentError> {
            Ok(self.entries.iter().map(|(k, _)| k.to_string()).collect())
        }

        async fn load(
            &self,
            _site: &SiteContext,
            key: &str,
        ) -> Result<Option<Bytes>, ContentError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(key) {
                return Err(ContentError::backend("content store unavailable"));
            }
            Ok(self
                .entries
                .iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, v)| v.map(|v| Bytes::from_static(v.as_bytes()))))
        }
    }

    fn context() -> SiteContext {
        SiteContext::new(
            "editorial",
            false,
            SiteConfig::default(),
            CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn in_place_fills_live_cache() {
        let ctx = context();
        let live = ctx.cache();
        live.put("/stale", Bytes::from_static(b"kept"));

        let source = Arc::new(ListSource::new(vec![("/a", Some("A")), ("/b", Some("B"))]));
        let report = ContentCacheWarmer::new(source)
            .warm_up_cache(&ctx, false)
            .await
            .expect("warm-up succeeds");

        assert!(!report.switched);
        assert_eq!(report.warmed, 2);
        assert_eq!(report.generation, live.generation());
        assert!(Arc::ptr_eq(&ctx.cache(), &live));
        assert_eq!(live.get("/a"), Some(Bytes::from_static(b"A")));
        assert!(live.contains("/stale"));
    }

    #[tokio::test]
    async fn switch_publishes_a_fresh_cache() {
        let ctx = context();
        let before = ctx.cache();
        before.put("/stale", Bytes::from_static(b"old"));

        let source = Arc::new(ListSource::new(vec![("/a", Some("A"))]));
        let report = ContentCacheWarmer::new(source)
            .warm_up_cache(&ctx, true)
            .await
            .expect("warm-up succeeds");

        let after = ctx.cache();
        assert!(report.switched);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.generation(), report.generation);
        assert_eq!(after.get("/a"), Some(Bytes::from_static(b"A")));
        assert!(!after.contains("/stale"));
    }

    #[tokio::test]
    async fn vanished_and_duplicate_keys_are_skipped() {
        let ctx = context();
        let source = Arc::new(ListSource::new(vec![
            ("/a", Some("A")),
            ("/gone", None),
            ("/a", Some("A")),
        ]));

        let report = ContentCacheWarmer::new(source.clone())
            .warm_up_cache(&ctx, true)
            .await
            .expect("warm-up succeeds");

        assert_eq!(report.warmed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_switch_keeps_previous_cache_live() {
        let ctx = context();
        let before = ctx.cache();

        let mut source = ListSource::new(vec![("/a", Some("A")), ("/b", Some("B"))]);
        source.fail_on = Some("/b");

        let err = ContentCacheWarmer::new(Arc::new(source))
            .warm_up_cache(&ctx, true)
            .await
            .expect_err("load failure surfaces");

        assert!(matches!(err, CacheWarmError::Load { ref key, .. } if key == "/b"));
        assert!(Arc::ptr_eq(&ctx.cache(), &before));
        assert!(before.is_empty());
    }

    fn five_entries() -> ListSource {
        ListSource::new(vec![
            ("/e0", Some("0")),
            ("/e1", Some("1")),
            ("/e2", Some("2")),
            ("/e3", Some("3")),
            ("/e4", Some("4")),
        ])
    }

    fn small_context() -> SiteContext {
        SiteContext::new(
            "editorial",
            false,
            SiteConfig::default(),
            CacheConfig { entry_limit: 2 },
        )
    }

    #[tokio::test]
    async fn switch_refuses_content_larger_than_the_cache() {
        let ctx = small_context();
        let before = ctx.cache();
        before.put("/old", Bytes::from_static(b"old"));

        let err = ContentCacheWarmer::new(Arc::new(five_entries()))
            .warm_up_cache(&ctx, true)
            .await
            .expect_err("overflow is fatal in switch mode");

        assert!(matches!(
            err,
            CacheWarmError::Overflow { capacity: 2, ref evicted, .. } if evicted == "/e0"
        ));
        assert!(Arc::ptr_eq(&ctx.cache(), &before));
        assert!(before.contains("/old"));
    }

    #[tokio::test]
    async fn in_place_reports_only_resident_entries() {
        let ctx = small_context();

        let report = ContentCacheWarmer::new(Arc::new(five_entries()))
            .warm_up_cache(&ctx, false)
            .await
            .expect("in-place warm-up tolerates eviction");

        let live = ctx.cache();
        assert_eq!(report.warmed, 2);
        assert_eq!(report.evicted, 3);
        assert_eq!(live.len(), report.warmed);
        assert!(live.contains("/e3"));
        assert!(live.contains("/e4"));
        assert!(!live.contains("/e0"));
    }

    #[tokio::test]
    async fn stale_entries_evicted_in_place_are_not_counted() {
        let ctx = small_context();
        ctx.cache().put("/stale", Bytes::from_static(b"old"));

        let report = ContentCacheWarmer::new(Arc::new(ListSource::new(vec![
            ("/a", Some("A")),
            ("/b", Some("B")),
        ])))
        .warm_up_cache(&ctx, false)
        .await
        .expect("warm-up succeeds");

        assert_eq!(report.warmed, 2);
        assert_eq!(report.evicted, 0);
        assert!(!ctx.cache().contains("/stale"));
    }
}
