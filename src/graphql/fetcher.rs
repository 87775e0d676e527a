//! Compiles a content-type query field into one search request and shapes the
//! returned rows.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::GraphqlSettings;
use crate::infra::telemetry::{METRIC_QUERY_FAILED, METRIC_QUERY_MS};
use crate::search::{BoolQuery, Clause, SearchBackend, SearchError, SearchRequest, Sort, SortOrder};
use crate::site::SiteConfig;

use super::environment::QueryEnvironment;
use super::filters::{self, FilterError, FilterPlacement};
use super::reshape::reshape_row;
use super::schema::{
    ARG_NAME_LIMIT, ARG_NAME_OFFSET, ARG_NAME_SORT_BY, ARG_NAME_SORT_ORDER,
    CONTENT_TYPE_REGEX_COMPONENT, CONTENT_TYPE_REGEX_PAGE, FIELD_NAME_COMPONENTS,
    FIELD_NAME_CONTENT_ITEMS, FIELD_NAME_ITEMS, FIELD_NAME_PAGES, FILTER_NAME, FieldNameCodec,
};
use super::selection::{Field, FragmentLookup, Literal, Selection};

const TYPENAME_FIELD: &str = "__typename";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown fragment `{0}`")]
    UnknownFragment(String),
    #[error("fragment `{0}` spreads itself")]
    FragmentCycle(String),
    #[error("argument `{name}` must be {expected}")]
    InvalidArgument {
        name: String,
        expected: &'static str,
    },
    #[error("unusable filter on `{path}`: {source}")]
    Filter {
        path: String,
        #[source]
        source: FilterError,
    },
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Rows and total hit count of one query field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub items: Vec<Map<String, Value>>,
    pub total: u64,
}

/// Defaults applied when a query omits pagination or sort arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    pub default_limit: i64,
    pub default_sort_field: String,
    pub default_sort_order: SortOrder,
    /// Fail the query on unusable filters instead of dropping them.
    pub strict_filters: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_sort_field: "_score".to_string(),
            default_sort_order: SortOrder::Desc,
            strict_filters: false,
        }
    }
}

impl From<&GraphqlSettings> for FetcherConfig {
    fn from(settings: &GraphqlSettings) -> Self {
        Self {
            default_limit: i64::from(settings.default_limit.get()),
            default_sort_field: settings.default_sort_field.clone(),
            default_sort_order: settings.default_sort_order,
            strict_filters: settings.strict_filters,
        }
    }
}

impl FetcherConfig {
    /// Apply the `graphql.*` overrides of a site configuration.
    pub fn for_site(mut self, site: &SiteConfig) -> Self {
        match site.get_int("graphql.default_limit") {
            Some(limit) if limit > 0 => self.default_limit = limit,
            Some(limit) => warn!(
                target: "lectern::graphql",
                limit,
                "ignoring non-positive site default limit"
            ),
            None => {}
        }
        if let Some(field) = site.get_str("graphql.default_sort_field") {
            self.default_sort_field = field.to_string();
        }
        if let Some(order) = site.get_str("graphql.default_sort_order") {
            match order.parse() {
                Ok(order) => self.default_sort_order = order,
                Err(err) => warn!(
                    target: "lectern::graphql",
                    error = %err,
                    "ignoring invalid site default sort order"
                ),
            }
        }
        if let Some(strict) = site.get_bool("graphql.strict_filters") {
            self.strict_filters = strict;
        }
        self
    }
}

/// Per-call state of the selection walk.
struct Walk<'a> {
    fragments: &'a dyn FragmentLookup,
    /// Fragments spread on the current path.
    active: Vec<String>,
    query: BoolQuery,
    includes: Vec<String>,
}

/// Data fetcher for content-type query fields.
#[derive(Clone)]
pub struct ContentTypeFetcher {
    backend: Arc<dyn SearchBackend>,
    codec: Arc<dyn FieldNameCodec>,
    config: FetcherConfig,
}

impl ContentTypeFetcher {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        codec: Arc<dyn FieldNameCodec>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            backend,
            codec,
            config,
        }
    }

    /// Run the query: compile, search once, reshape.
    pub async fn fetch(&self, env: &QueryEnvironment) -> Result<FetchResult, QueryError> {
        let started_at = Instant::now();
        let outcome = self.fetch_inner(env, started_at).await;
        histogram!(METRIC_QUERY_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        if let Err(err) = &outcome {
            counter!(METRIC_QUERY_FAILED).increment(1);
            warn!(
                target: "lectern::graphql",
                field = %env.field.name,
                error = %err,
                "content query failed"
            );
        }
        outcome
    }

    async fn fetch_inner(
        &self,
        env: &QueryEnvironment,
        started_at: Instant,
    ) -> Result<FetchResult, QueryError> {
        let request = self.compile(env)?;
        trace!(
            target: "lectern::graphql",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "query built"
        );
        debug!(
            target: "lectern::graphql",
            field = %env.field.name,
            body = %request.to_body(),
            "executing content query"
        );

        let response = self.backend.search(&request).await?;
        trace!(
            target: "lectern::graphql",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            total = response.total,
            "search executed"
        );

        let items = response
            .rows
            .into_iter()
            .map(|row| reshape_row(row, self.codec.as_ref()))
            .collect();
        trace!(
            target: "lectern::graphql",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "rows reshaped"
        );

        Ok(FetchResult {
            items,
            total: response.total,
        })
    }

    /// Compile the query field into a search request without executing it.
    pub fn compile(&self, env: &QueryEnvironment) -> Result<SearchRequest, QueryError> {
        let from = int_argument(env, ARG_NAME_OFFSET)?.unwrap_or(0);
        let size = int_argument(env, ARG_NAME_LIMIT)?.unwrap_or(self.config.default_limit);
        let sort_field = match env.argument(ARG_NAME_SORT_BY) {
            Some(Value::String(field)) => field,
            Some(_) => return Err(invalid(ARG_NAME_SORT_BY, "a string")),
            None => self.config.default_sort_field.clone(),
        };
        let sort_order = match env.argument(ARG_NAME_SORT_ORDER) {
            Some(Value::String(order)) => order
                .parse()
                .map_err(|_| invalid(ARG_NAME_SORT_ORDER, "ASC or DESC"))?,
            Some(_) => return Err(invalid(ARG_NAME_SORT_ORDER, "ASC or DESC")),
            None => self.config.default_sort_order,
        };

        let content_type = self.codec.content_type_attribute().to_string();
        let mut walk = Walk {
            fragments: env.fragments(),
            active: Vec::new(),
            query: BoolQuery::default(),
            includes: vec![content_type.clone()],
        };
        walk.query.filter(self.base_filter(&env.field, content_type));

        if let Some(items) = env.field.child_field(FIELD_NAME_ITEMS) {
            for selection in items.selection_set.iter().flat_map(|set| set.selections()) {
                self.process_selection("", selection, &mut walk)?;
            }
        }

        Ok(SearchRequest {
            query: walk.query,
            includes: walk.includes,
            from,
            size,
            sort: Sort {
                field: sort_field,
                order: sort_order,
            },
        })
    }

    fn base_filter(&self, field: &Field, content_type: String) -> Clause {
        match field.name.as_str() {
            FIELD_NAME_CONTENT_ITEMS => Clause::Exists {
                field: content_type,
            },
            FIELD_NAME_PAGES => Clause::Regexp {
                field: content_type,
                pattern: CONTENT_TYPE_REGEX_PAGE.to_string(),
            },
            FIELD_NAME_COMPONENTS => Clause::Regexp {
                field: content_type,
                pattern: CONTENT_TYPE_REGEX_COMPONENT.to_string(),
            },
            name => Clause::Term {
                field: content_type,
                value: json!(self.codec.original_name(name)),
            },
        }
    }

    fn process_selection(
        &self,
        parent: &str,
        selection: &Selection,
        walk: &mut Walk<'_>,
    ) -> Result<(), QueryError> {
        match selection {
            Selection::Field(field) => self.process_field(parent, field, walk),
            Selection::InlineFragment(fragment) => {
                for child in fragment.selection_set.selections() {
                    self.process_selection(parent, child, walk)?;
                }
                Ok(())
            }
            Selection::FragmentSpread(spread) => {
                if walk.active.iter().any(|name| *name == spread.name) {
                    return Err(QueryError::FragmentCycle(spread.name.clone()));
                }
                let fragments = walk.fragments;
                let definition = fragments
                    .fragment(&spread.name)
                    .ok_or_else(|| QueryError::UnknownFragment(spread.name.clone()))?;

                walk.active.push(spread.name.clone());
                for child in definition.selection_set.selections() {
                    self.process_selection(parent, child, walk)?;
                }
                walk.active.pop();
                Ok(())
            }
        }
    }

    fn process_field(
        &self,
        parent: &str,
        field: &Field,
        walk: &mut Walk<'_>,
    ) -> Result<(), QueryError> {
        if field.name == TYPENAME_FIELD {
            return Ok(());
        }

        let name = self.codec.original_name(&field.name);
        let path = if parent.is_empty() {
            name
        } else {
            format!("{parent}.{name}")
        };

        match &field.selection_set {
            Some(children) if !children.selections().is_empty() => {
                for child in children.selections() {
                    self.process_selection(&path, child, walk)?;
                }
                Ok(())
            }
            _ => {
                self.add_filters(&path, field, walk)?;
                walk.includes.push(path);
                Ok(())
            }
        }
    }

    fn add_filters(&self, path: &str, field: &Field, walk: &mut Walk<'_>) -> Result<(), QueryError> {
        let entries = match field.argument(FILTER_NAME) {
            None | Some(Literal::Null) => return Ok(()),
            Some(Literal::Object(entries)) => entries,
            Some(other) => {
                if self.config.strict_filters {
                    return Err(invalid(FILTER_NAME, "an object"));
                }
                warn!(
                    target: "lectern::graphql",
                    path,
                    kind = other.kind(),
                    "ignoring filter that is not an object"
                );
                return Ok(());
            }
        };

        for entry in entries {
            match filters::compile(path, &entry.name, &entry.value) {
                Ok(FilterPlacement::Filter(clause)) => walk.query.filter(clause),
                Ok(FilterPlacement::MustNot(clause)) => walk.query.must_not(clause),
                Err(source) if self.config.strict_filters => {
                    return Err(QueryError::Filter {
                        path: path.to_string(),
                        source,
                    });
                }
                Err(err) => warn!(
                    target: "lectern::graphql",
                    path,
                    error = %err,
                    "dropping unusable filter"
                ),
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, expected: &'static str) -> QueryError {
    QueryError::InvalidArgument {
        name: name.to_string(),
        expected,
    }
}

fn int_argument(env: &QueryEnvironment, name: &str) -> Result<Option<i64>, QueryError> {
    match env.argument(name) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(name, "an integer")),
    }
}
