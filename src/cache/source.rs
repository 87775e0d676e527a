//! Content sources that know what belongs in a warm site cache.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::site::SiteContext;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to enumerate content of site `{site}`: {detail}")]
    Enumerate { site: String, detail: String },
    #[error("failed to read `{key}`: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("content backend error: {0}")]
    Backend(String),
}

impl ContentError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Anything able to enumerate and produce the entries of a warm site cache.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Keys of every entry that should be cached for `site`.
    async fn keys(&self, site: &SiteContext) -> Result<Vec<String>, ContentError>;

    /// Load one entry; `Ok(None)` when it disappeared since enumeration.
    async fn load(&self, site: &SiteContext, key: &str) -> Result<Option<Bytes>, ContentError>;
}

/// Serves every file below `<root>/<site>/`, keyed by `/`-rooted relative path.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn site_root(&self, site: &SiteContext) -> PathBuf {
        self.root.join(site.site_name())
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn keys(&self, site: &SiteContext) -> Result<Vec<String>, ContentError> {
        let site_root = self.site_root(site);
        if !site_root.is_dir() {
            debug!(site = site.site_name(), "No content directory, nothing to warm");
            return Ok(Vec::new());
        }

        let site_name = site.site_name().to_string();
        tokio::task::spawn_blocking(move || walk_keys(&site_root, &site_name))
            .await
            .map_err(|err| ContentError::Enumerate {
                site: site.site_name().to_string(),
                detail: err.to_string(),
            })?
    }

    async fn load(&self, site: &SiteContext, key: &str) -> Result<Option<Bytes>, ContentError> {
        let Some(path) = resolve_key(&self.site_root(site), key) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ContentError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }
}

fn walk_keys(site_root: &Path, site: &str) -> Result<Vec<String>, ContentError> {
    let mut keys = Vec::new();
    let walker = WalkDir::new(site_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(|err| ContentError::Enumerate {
            site: site.to_string(),
            detail: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(site_root) {
            keys.push(to_key(relative));
        }
    }
    Ok(keys)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn to_key(relative: &Path) -> String {
    let mut key = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            key.push('/');
            key.push_str(&part.to_string_lossy());
        }
    }
    key
}

/// Map a cache key back to a file path, refusing anything that escapes the site root.
fn resolve_key(site_root: &Path, key: &str) -> Option<PathBuf> {
    let mut path = site_root.to_path_buf();
    for part in key.split('/').filter(|part| !part.is_empty()) {
        if part == "." || part == ".." {
            return None;
        }
        path.push(part);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::cache::CacheConfig;
    use crate::site::SiteConfig;

    use super::*;

    fn site(name: &str) -> SiteContext {
        SiteContext::new(name, false, SiteConfig::default(), CacheConfig::default())
    }

    #[tokio::test]
    async fn enumerates_files_as_rooted_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let site_root = dir.path().join("editorial");
        fs::create_dir_all(site_root.join("site/website/about")).expect("dirs");
        fs::create_dir_all(site_root.join(".git")).expect("hidden dir");
        fs::write(site_root.join("site/website/index.xml"), "<page/>").expect("file");
        fs::write(site_root.join("site/website/about/index.xml"), "<about/>").expect("file");
        fs::write(site_root.join(".git/HEAD"), "ref").expect("hidden file");

        let source = FsContentSource::new(dir.path());
        let keys = source.keys(&site("editorial")).await.expect("keys");

        assert_eq!(
            keys,
            vec![
                "/site/website/about/index.xml".to_string(),
                "/site/website/index.xml".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_site_directory_has_no_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FsContentSource::new(dir.path());
        assert!(source.keys(&site("ghost")).await.expect("keys").is_empty());
    }

    #[tokio::test]
    async fn load_reads_bytes_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let site_root = dir.path().join("editorial");
        fs::create_dir_all(&site_root).expect("dirs");
        fs::write(site_root.join("index.xml"), "<page/>").expect("file");

        let source = FsContentSource::new(dir.path());
        let ctx = site("editorial");

        assert_eq!(
            source.load(&ctx, "/index.xml").await.expect("load"),
            Some(Bytes::from_static(b"<page/>"))
        );
        assert!(source.load(&ctx, "/gone.xml").await.expect("load").is_none());
        assert!(source.load(&ctx, "/../escape").await.expect("load").is_none());
    }
}
