//! GraphQL content queries compiled into search requests.
//!
//! The front end hands over a [`QueryEnvironment`] per top-level query field;
//! [`ContentTypeFetcher`] walks its `items` selection, compiles one
//! [`SearchRequest`](crate::search::SearchRequest), runs it and reshapes the
//! rows back into GraphQL field naming.

mod environment;
mod fetcher;
pub mod filters;
mod reshape;
pub mod schema;
mod selection;

pub use environment::QueryEnvironment;
pub use fetcher::{ContentTypeFetcher, FetchResult, FetcherConfig, QueryError};
pub use filters::{FilterError, FilterPlacement};
pub use reshape::reshape_row;
pub use schema::{DefaultFieldNameCodec, FieldNameCodec};
pub use selection::{
    Argument, Field, FragmentDefinition, FragmentLookup, FragmentSpread, InlineFragment, Literal,
    ObjectField, Selection, SelectionSet,
};
