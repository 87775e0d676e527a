//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::search::SortOrder;

mod cli;

pub use cli::{CliArgs, Command, CommonOverrides, QueryArgs, SitesArgs, WarmArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "lectern";
const DEFAULT_SEARCH_URL: &str = "http://127.0.0.1:9200";
const DEFAULT_INDEX_PATTERN: &str = "{site}";
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_LIMIT: u64 = 10;
const DEFAULT_SORT_FIELD: &str = "_score";
const DEFAULT_SORT_ORDER: &str = "DESC";
const DEFAULT_CACHE_ENTRY_LIMIT: usize = 10_000;
const DEFAULT_SITES_ROOT: &str = "sites";
const DEFAULT_FALLBACK_SITE: &str = "default";

/// Placeholder substituted with the site identifier in `search.index_pattern`.
pub const SITE_PLACEHOLDER: &str = "{site}";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub search: SearchSettings,
    pub graphql: GraphqlSettings,
    pub cache: CacheSettings,
    pub sites: SitesSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub url: Url,
    pub index_pattern: String,
    pub timeout: Duration,
}

impl SearchSettings {
    /// Resolve the index name used for the given site.
    pub fn index_for(&self, site: &str) -> String {
        self.index_pattern.replace(SITE_PLACEHOLDER, site)
    }
}

#[derive(Debug, Clone)]
pub struct GraphqlSettings {
    pub default_limit: NonZeroU32,
    pub default_sort_field: String,
    pub default_sort_order: SortOrder,
    pub strict_filters: bool,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub entry_limit: usize,
}

#[derive(Debug, Clone)]
pub struct SitesSettings {
    pub root: PathBuf,
    pub fallback_site: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("LECTERN").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    search: RawSearchSettings,
    graphql: RawGraphqlSettings,
    cache: RawCacheSettings,
    sites: RawSitesSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.search_url.as_ref() {
            self.search.url = Some(url.clone());
        }
        if let Some(root) = overrides.sites_root.as_ref() {
            self.sites.root = Some(root.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            search,
            graphql,
            cache,
            sites,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            search: build_search_settings(search)?,
            graphql: build_graphql_settings(graphql)?,
            cache: build_cache_settings(cache),
            sites: build_sites_settings(sites)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_search_settings(search: RawSearchSettings) -> Result<SearchSettings, LoadError> {
    let raw_url = search
        .url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());
    let url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("search.url", format!("`{raw_url}`: {err}")))?;

    let index_pattern = search
        .index_pattern
        .unwrap_or_else(|| DEFAULT_INDEX_PATTERN.to_string());
    if index_pattern.trim().is_empty() {
        return Err(LoadError::invalid(
            "search.index_pattern",
            "must not be empty",
        ));
    }

    let timeout_secs = search.timeout_seconds.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "search.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SearchSettings {
        url,
        index_pattern,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_graphql_settings(graphql: RawGraphqlSettings) -> Result<GraphqlSettings, LoadError> {
    let default_limit = non_zero_u32(
        graphql.default_limit.unwrap_or(DEFAULT_QUERY_LIMIT),
        "graphql.default_limit",
    )?;

    let default_sort_field = graphql
        .default_sort_field
        .unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string());
    if default_sort_field.trim().is_empty() {
        return Err(LoadError::invalid(
            "graphql.default_sort_field",
            "must not be empty",
        ));
    }

    let raw_order = graphql
        .default_sort_order
        .unwrap_or_else(|| DEFAULT_SORT_ORDER.to_string());
    let default_sort_order = SortOrder::from_str(&raw_order)
        .map_err(|err| LoadError::invalid("graphql.default_sort_order", err.to_string()))?;

    Ok(GraphqlSettings {
        default_limit,
        default_sort_field,
        default_sort_order,
        strict_filters: graphql.strict_filters.unwrap_or(false),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        entry_limit: cache.entry_limit.unwrap_or(DEFAULT_CACHE_ENTRY_LIMIT),
    }
}

fn build_sites_settings(sites: RawSitesSettings) -> Result<SitesSettings, LoadError> {
    let fallback_site = sites
        .fallback_site
        .unwrap_or_else(|| DEFAULT_FALLBACK_SITE.to_string());
    if fallback_site.trim().is_empty() {
        return Err(LoadError::invalid(
            "sites.fallback_site",
            "must not be empty",
        ));
    }

    Ok(SitesSettings {
        root: sites
            .root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SITES_ROOT)),
        fallback_site,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    url: Option<String>,
    index_pattern: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGraphqlSettings {
    default_limit: Option<u64>,
    default_sort_field: Option<String>,
    default_sort_order: Option<String>,
    strict_filters: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    entry_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSitesSettings {
    root: Option<PathBuf>,
    fallback_site: Option<String>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
