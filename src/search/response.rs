use serde_json::{Map, Value};

use super::client::SearchError;

/// Raw result of one search round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub total: u64,
    pub rows: Vec<Map<String, Value>>,
}

impl SearchResponse {
    /// Decode an Elasticsearch `_search` response body.
    ///
    /// `hits.total` is accepted both as a bare number and as `{ "value": n }`.
    /// Hits without a `_source` object contribute an empty row.
    pub fn from_body(body: Value) -> Result<Self, SearchError> {
        let Value::Object(mut body) = body else {
            return Err(SearchError::decode("response body is not an object"));
        };
        let Some(Value::Object(mut hits)) = body.remove("hits") else {
            return Err(SearchError::decode("response has no `hits` object"));
        };

        let total = match hits.get("total") {
            Some(Value::Number(number)) => number.as_u64(),
            Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
            _ => None,
        }
        .ok_or_else(|| SearchError::decode("response has no usable `hits.total`"))?;

        let rows = match hits.remove("hits") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .map(|entry| match entry {
                    Value::Object(mut hit) => match hit.remove("_source") {
                        Some(Value::Object(source)) => source,
                        _ => Map::new(),
                    },
                    _ => Map::new(),
                })
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err(SearchError::decode("`hits.hits` is not an array")),
        };

        Ok(Self { total, rows })
    }
}
