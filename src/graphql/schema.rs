//! Field and argument names shared with the GraphQL schema, and the codec that
//! maps GraphQL field names to search attribute names.

/// Wrapper field holding the returned rows.
pub const FIELD_NAME_ITEMS: &str = "items";
/// Embedded collection entry that must always surface as a list.
pub const FIELD_NAME_ITEM: &str = "item";
/// Query field matching every content item.
pub const FIELD_NAME_CONTENT_ITEMS: &str = "contentItems";
pub const FIELD_NAME_PAGES: &str = "pages";
pub const FIELD_NAME_COMPONENTS: &str = "components";

pub const ARG_NAME_OFFSET: &str = "offset";
pub const ARG_NAME_LIMIT: &str = "limit";
pub const ARG_NAME_SORT_BY: &str = "sortBy";
pub const ARG_NAME_SORT_ORDER: &str = "sortOrder";
/// Argument carrying the filter object of a leaf field.
pub const FILTER_NAME: &str = "filter";

pub const ARG_NAME_EQUALS: &str = "equals";
pub const ARG_NAME_MATCHES: &str = "matches";
pub const ARG_NAME_REGEX: &str = "regex";
pub const ARG_NAME_LT: &str = "lt";
pub const ARG_NAME_GT: &str = "gt";
pub const ARG_NAME_LTE: &str = "lte";
pub const ARG_NAME_GTE: &str = "gte";
pub const ARG_NAME_EXISTS: &str = "exists";

// Regexes are matched against the whole value, no anchors needed.
pub const CONTENT_TYPE_REGEX_PAGE: &str = "/?page/.*";
pub const CONTENT_TYPE_REGEX_COMPONENT: &str = "/?component/.*";

/// Bidirectional mapping between GraphQL field names and backend attribute names.
pub trait FieldNameCodec: Send + Sync {
    /// Backend attribute name for a GraphQL field name.
    fn original_name(&self, graphql_name: &str) -> String;

    /// GraphQL field name for a backend attribute name.
    fn graphql_name(&self, original_name: &str) -> String;

    /// Backend attribute holding the content type of an item.
    fn content_type_attribute(&self) -> &str;
}

/// GraphQL names cannot contain `-`, so it is spelled `__` on the GraphQL side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFieldNameCodec;

const ORIGINAL_SEPARATOR: &str = "-";
const GRAPHQL_SEPARATOR: &str = "__";
const CONTENT_TYPE_ATTRIBUTE: &str = "content-type";

impl FieldNameCodec for DefaultFieldNameCodec {
    fn original_name(&self, graphql_name: &str) -> String {
        graphql_name.replace(GRAPHQL_SEPARATOR, ORIGINAL_SEPARATOR)
    }

    fn graphql_name(&self, original_name: &str) -> String {
        original_name.replace(ORIGINAL_SEPARATOR, GRAPHQL_SEPARATOR)
    }

    fn content_type_attribute(&self) -> &str {
        CONTENT_TYPE_ATTRIBUTE
    }
}
