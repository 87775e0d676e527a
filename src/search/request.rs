//! Structured search request compiled from a content query.
//!
//! The request is backend-neutral; [`SearchRequest::to_body`] renders it as an
//! Elasticsearch `_search` body.

use std::{fmt, str::FromStr};

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Direction of the sort applied to the result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Error)]
#[error("unknown sort order `{0}` (expected ASC or DESC)")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseSortOrderError(value.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Lt,
    Gt,
    Lte,
    Gte,
}

impl RangeBound {
    fn key(self) -> &'static str {
        match self {
            RangeBound::Lt => "lt",
            RangeBound::Gt => "gt",
            RangeBound::Lte => "lte",
            RangeBound::Gte => "gte",
        }
    }
}

/// A single filter clause anchored at a field path.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Exists { field: String },
    Term { field: String, value: Value },
    Match { field: String, value: Value },
    Regexp { field: String, pattern: String },
    Range {
        field: String,
        bound: RangeBound,
        value: Value,
    },
}

impl Clause {
    pub fn field(&self) -> &str {
        match self {
            Clause::Exists { field }
            | Clause::Term { field, .. }
            | Clause::Match { field, .. }
            | Clause::Regexp { field, .. }
            | Clause::Range { field, .. } => field,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Clause::Exists { field } => json!({ "exists": { "field": field } }),
            Clause::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Clause::Match { field, value } => json!({ "match": { field.as_str(): value } }),
            Clause::Regexp { field, pattern } => {
                json!({ "regexp": { field.as_str(): pattern } })
            }
            Clause::Range {
                field,
                bound,
                value,
            } => json!({ "range": { field.as_str(): { bound.key(): value } } }),
        }
    }
}

/// Boolean combination of clauses: every `filter` must hold, no `must_not` may hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub filter: Vec<Clause>,
    pub must_not: Vec<Clause>,
}

impl BoolQuery {
    pub fn filter(&mut self, clause: Clause) {
        self.filter.push(clause);
    }

    pub fn must_not(&mut self, clause: Clause) {
        self.must_not.push(clause);
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        if !self.filter.is_empty() {
            body.insert(
                "filter".to_string(),
                Value::Array(self.filter.iter().map(Clause::to_json).collect()),
            );
        }
        if !self.must_not.is_empty() {
            body.insert(
                "must_not".to_string(),
                Value::Array(self.must_not.iter().map(Clause::to_json).collect()),
            );
        }
        json!({ "bool": body })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: BoolQuery,
    pub includes: Vec<String>,
    pub from: i64,
    pub size: i64,
    pub sort: Sort,
}

impl SearchRequest {
    /// Render the request as an Elasticsearch `_search` body.
    pub fn to_body(&self) -> Value {
        json!({
            "query": self.query.to_json(),
            "from": self.from,
            "size": self.size,
            "sort": [ { self.sort.field.as_str(): { "order": self.sort.order.to_string() } } ],
            "_source": {
                "includes": self.includes,
                "excludes": [],
            },
        })
    }
}
