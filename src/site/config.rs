//! Site configuration tree loaded from `<root>/<site>/config/site.toml`.

use std::{path::Path, sync::Arc};

use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error("failed to read site configuration `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse site configuration `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Immutable, cheaply clonable configuration tree of one site.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    tree: Arc<Table>,
}

impl SiteConfig {
    pub fn new(tree: Table) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }

    /// Load the configuration file, yielding an empty tree when it does not exist.
    pub fn load(path: &Path) -> Result<Self, SiteConfigError> {
        if !path.is_file() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| SiteConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tree: Table = toml::from_str(&raw).map_err(|source| SiteConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(tree))
    }

    /// Look up a value by dotted path, e.g. `graphql.default_limit`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.tree.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_integer)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
