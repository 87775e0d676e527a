use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::SearchSettings;

use super::{request::SearchRequest, response::SearchResponse};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("search transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed search response: {0}")]
    Decode(String),
}

impl SearchError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// A search backend able to execute one structured request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

/// Elasticsearch `_search` client bound to a single index.
#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    client: Client,
    endpoint: Url,
}

impl ElasticsearchClient {
    pub fn new(settings: &SearchSettings, index: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()?;
        let endpoint = search_endpoint(&settings.url, index)?;
        Ok(Self { client, endpoint })
    }

    /// Client for the index configured for `site`.
    pub fn for_site(settings: &SearchSettings, site: &str) -> Result<Self, SearchError> {
        Self::new(settings, &settings.index_for(site))
    }

    pub fn user_agent() -> &'static str {
        concat!("lectern/", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let body = request.to_body();
        debug!(endpoint = %self.endpoint, query = %body, "Executing search");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        SearchResponse::from_body(body)
    }
}

fn search_endpoint(base: &Url, index: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("{index}/_search"))
}
