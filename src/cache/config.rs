//! Site cache configuration.
//!
//! Controls the per-site content cache via the `[cache]` section of `lectern.toml`.

use std::num::NonZeroUsize;

const DEFAULT_ENTRY_LIMIT: usize = 10_000;

/// Limits applied to every cache instance a site context creates.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entries held by one site cache before LRU eviction.
    pub entry_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_limit: DEFAULT_ENTRY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            entry_limit: settings.entry_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
