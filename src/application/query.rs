use std::{path::Path, sync::Arc};

use crate::{
    config::SearchSettings,
    graphql::{ContentTypeFetcher, FetchResult, FetcherConfig, FieldNameCodec, QueryEnvironment},
    search::{ElasticsearchClient, SearchBackend, SearchError},
    site::{SiteRegistry, with_site},
};

use super::error::AppError;

/// Hands out the search backend serving a site.
pub trait BackendProvider: Send + Sync {
    fn backend_for(&self, site: &str) -> Result<Arc<dyn SearchBackend>, SearchError>;
}

/// One Elasticsearch client per call, bound to the site's index.
#[derive(Debug, Clone)]
pub struct ElasticsearchProvider {
    settings: SearchSettings,
}

impl ElasticsearchProvider {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }
}

impl BackendProvider for ElasticsearchProvider {
    fn backend_for(&self, site: &str) -> Result<Arc<dyn SearchBackend>, SearchError> {
        Ok(Arc::new(ElasticsearchClient::for_site(&self.settings, site)?))
    }
}

/// Runs content queries in the context of a site.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<SiteRegistry>,
    backends: Arc<dyn BackendProvider>,
    codec: Arc<dyn FieldNameCodec>,
    defaults: FetcherConfig,
}

impl QueryService {
    pub fn new(
        registry: Arc<SiteRegistry>,
        backends: Arc<dyn BackendProvider>,
        codec: Arc<dyn FieldNameCodec>,
        defaults: FetcherConfig,
    ) -> Self {
        Self {
            registry,
            backends,
            codec,
            defaults,
        }
    }

    /// Execute `env` for `site`; unknown sites are served by the fallback context.
    pub async fn run(&self, site: &str, env: &QueryEnvironment) -> Result<FetchResult, AppError> {
        let context = self.registry.resolve(site)?;
        let config = self.defaults.clone().for_site(context.config());
        let backend = self.backends.backend_for(context.site_name())?;
        let fetcher = ContentTypeFetcher::new(backend, Arc::clone(&self.codec), config);

        let result = with_site(context, fetcher.fetch(env)).await?;
        Ok(result)
    }
}

/// Read a JSON-encoded [`QueryEnvironment`] from disk.
pub async fn load_document(path: &Path) -> Result<QueryEnvironment, AppError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|source| AppError::Document {
            path: path.display().to_string(),
            source,
        })?;
    serde_json::from_slice(&raw).map_err(|source| AppError::MalformedDocument {
        path: path.display().to_string(),
        source,
    })
}
