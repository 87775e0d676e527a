//! Registry of live site contexts.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::CacheConfig;
use crate::config::SitesSettings;

use super::{
    config::{SiteConfig, SiteConfigError},
    context::SiteContext,
};

const SITE_CONFIG_PATH: &str = "config/site.toml";

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("invalid site name `{0}`")]
    InvalidName(String),
    #[error("failed to load configuration for site `{site}`: {source}")]
    Config {
        site: String,
        #[source]
        source: SiteConfigError,
    },
    #[error("failed to list sites under `{path}`: {source}")]
    Discover {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Creates site contexts on first access and keeps them until removed.
pub struct SiteRegistry {
    root: PathBuf,
    fallback_site: String,
    cache_config: CacheConfig,
    contexts: DashMap<String, Arc<SiteContext>>,
}

impl SiteRegistry {
    pub fn new(
        root: impl Into<PathBuf>,
        fallback_site: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            root: root.into(),
            fallback_site: fallback_site.into(),
            cache_config,
            contexts: DashMap::new(),
        }
    }

    pub fn from_settings(settings: &SitesSettings, cache_config: CacheConfig) -> Self {
        Self::new(
            settings.root.clone(),
            settings.fallback_site.clone(),
            cache_config,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the content of `site`.
    pub fn site_root(&self, site: &str) -> PathBuf {
        self.root.join(site)
    }

    /// Return the context of `site`, creating it on first access.
    pub fn get_or_create(&self, site: &str) -> Result<Arc<SiteContext>, SiteError> {
        validate_site_name(site)?;

        if let Some(existing) = self.contexts.get(site) {
            return Ok(Arc::clone(existing.value()));
        }

        let config = SiteConfig::load(&self.site_root(site).join(SITE_CONFIG_PATH)).map_err(
            |source| SiteError::Config {
                site: site.to_string(),
                source,
            },
        )?;
        let fallback = site == self.fallback_site;
        let created = Arc::new(SiteContext::new(
            site,
            fallback,
            config,
            self.cache_config.clone(),
        ));

        // A concurrent creator may have won; keep whichever landed first.
        let context = Arc::clone(
            self.contexts
                .entry(site.to_string())
                .or_insert(created)
                .value(),
        );
        info!(site, fallback = context.is_fallback(), "Site context ready");
        Ok(context)
    }

    /// The shared context used when a request matches no known site.
    pub fn fallback(&self) -> Result<Arc<SiteContext>, SiteError> {
        self.get_or_create(&self.fallback_site)
    }

    /// Resolve a site by name, falling back when it has no content directory.
    pub fn resolve(&self, site: &str) -> Result<Arc<SiteContext>, SiteError> {
        if validate_site_name(site).is_ok() && self.site_root(site).is_dir() {
            self.get_or_create(site)
        } else {
            debug!(site, "Unknown site, using fallback context");
            self.fallback()
        }
    }

    pub fn get(&self, site: &str) -> Option<Arc<SiteContext>> {
        self.contexts
            .get(site)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Destroy the context of `site`; in-flight holders keep their reference.
    pub fn remove(&self, site: &str) -> Option<Arc<SiteContext>> {
        let removed = self.contexts.remove(site).map(|(_, context)| context);
        if removed.is_some() {
            info!(site, "Site context removed");
        }
        removed
    }

    /// Drop every context, as on shutdown.
    pub fn clear(&self) {
        self.contexts.clear();
    }

    pub fn list(&self) -> Vec<Arc<SiteContext>> {
        self.contexts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of live site-specific contexts; the fallback context is not counted.
    pub fn site_usage(&self) -> usize {
        self.contexts
            .iter()
            .filter(|entry| !entry.value().is_fallback())
            .count()
    }

    /// Names of the site directories present under the content root, sorted.
    pub fn discover(&self) -> Result<Vec<String>, SiteError> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| SiteError::Discover {
            path: self.root.display().to_string(),
            source,
        })?;

        let mut sites: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_site_name(name).is_ok())
            .collect();
        sites.sort();
        Ok(sites)
    }
}

fn validate_site_name(site: &str) -> Result<(), SiteError> {
    let valid = !site.is_empty()
        && !site.starts_with('.')
        && site
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SiteError::InvalidName(site.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn registry(root: &Path) -> SiteRegistry {
        SiteRegistry::new(root, "default", CacheConfig::default())
    }

    #[test]
    fn creates_context_once_per_site() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(dir.path());

        let first = registry.get_or_create("editorial").expect("context");
        let second = registry.get_or_create("editorial").expect("context");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.site_name(), "editorial");
        assert!(!first.is_fallback());
    }

    #[test]
    fn loads_site_configuration_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_dir = dir.path().join("editorial/config");
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(
            config_dir.join("site.toml"),
            "[graphql]\ndefault_limit = 5\n",
        )
        .expect("write config");

        let context = registry(dir.path())
            .get_or_create("editorial")
            .expect("context");
        assert_eq!(context.config().get_int("graphql.default_limit"), Some(5));
    }

    #[test]
    fn unknown_site_resolves_to_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("editorial")).expect("site dir");
        let registry = registry(dir.path());

        let known = registry.resolve("editorial").expect("context");
        let unknown = registry.resolve("missing").expect("context");

        assert!(!known.is_fallback());
        assert!(unknown.is_fallback());
        assert_eq!(unknown.site_name(), "default");
    }

    #[test]
    fn site_usage_ignores_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(dir.path());

        registry.fallback().expect("fallback");
        registry.get_or_create("a").expect("a");
        registry.get_or_create("b").expect("b");

        assert_eq!(registry.list().len(), 3);
        assert_eq!(registry.site_usage(), 2);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.site_usage(), 1);

        registry.clear();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn rejects_path_like_site_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(dir.path());

        assert!(matches!(
            registry.get_or_create("../etc"),
            Err(SiteError::InvalidName(_))
        ));
        assert!(registry.get_or_create("").is_err());
    }

    #[test]
    fn discover_lists_site_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("beta")).expect("beta");
        fs::create_dir_all(dir.path().join("alpha")).expect("alpha");
        fs::write(dir.path().join("README"), "not a site").expect("file");

        let sites = registry(dir.path()).discover().expect("discover");
        assert_eq!(sites, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
