//! Per-site content cache.
//!
//! - [`SiteCache`]: the LRU-bounded store a site context serves from
//! - [`ContentSource`]: enumerates and loads what a warm cache contains
//! - [`SiteCacheWarmer`]: fills a site's cache, in place or through a hot swap
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! entry_limit = 10000
//! ```

mod config;
mod lock;
mod source;
mod store;
mod warmer;

pub use config::CacheConfig;
pub use source::{ContentError, ContentSource, FsContentSource};
pub use store::SiteCache;
pub use warmer::{CacheWarmError, ContentCacheWarmer, SiteCacheWarmer, WarmReport};
