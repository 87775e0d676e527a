//! Search backend seam: the structured request model, the response decoder and
//! the Elasticsearch client.

mod client;
mod request;
mod response;

pub use client::{ElasticsearchClient, SearchBackend, SearchError};
pub use request::{
    BoolQuery, Clause, ParseSortOrderError, RangeBound, SearchRequest, Sort, SortOrder,
};
pub use response::SearchResponse;
