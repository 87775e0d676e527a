use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    cache::CacheWarmError,
    config::LoadError,
    graphql::QueryError,
    infra::error::InfraError,
    search::SearchError,
    site::SiteError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Warm(#[from] CacheWarmError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("failed to read query document `{path}`: {source}")]
    Document {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed query document `{path}`: {source}")]
    MalformedDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Messages of this error and every error in its source chain, outermost first.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = StdError::source(self);
        while let Some(inner) = current {
            let message = inner.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = inner.source();
        }
        messages
    }

    /// Process exit code reported by the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Document { .. } | AppError::MalformedDocument { .. } => 2,
            AppError::Search(_) | AppError::Query(QueryError::Search(_)) => 3,
            _ => 1,
        }
    }
}
