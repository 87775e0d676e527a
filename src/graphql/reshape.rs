//! Reshape raw search rows into the field naming of the query layer.

use serde_json::{Map, Value};

use super::schema::{FIELD_NAME_ITEM, FieldNameCodec};

/// Translate the keys of `row` to query-layer names, recursing into nested
/// mappings. An `item` entry always comes out as a list: a lone value is
/// wrapped and a missing (`null`) one becomes empty.
pub fn reshape_row(row: Map<String, Value>, codec: &dyn FieldNameCodec) -> Map<String, Value> {
    row.into_iter()
        .map(|(key, value)| {
            let value = if key == FIELD_NAME_ITEM {
                Value::Array(into_item_list(value, codec))
            } else {
                reshape_value(value, codec)
            };
            (codec.graphql_name(&key), value)
        })
        .collect()
}

fn reshape_value(value: Value, codec: &dyn FieldNameCodec) -> Value {
    match value {
        Value::Object(map) => Value::Object(reshape_row(map, codec)),
        Value::Array(values) => Value::Array(
            values
                .into_iter()
                .map(|value| reshape_value(value, codec))
                .collect(),
        ),
        other => other,
    }
}

fn into_item_list(value: Value, codec: &dyn FieldNameCodec) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(values) => values
            .into_iter()
            .map(|value| reshape_value(value, codec))
            .collect(),
        single => vec![reshape_value(single, codec)],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::graphql::schema::DefaultFieldNameCodec;

    use super::*;

    fn reshape(value: Value) -> Value {
        let Value::Object(row) = value else {
            panic!("row must be an object");
        };
        Value::Object(reshape_row(row, &DefaultFieldNameCodec))
    }

    #[test]
    fn single_item_is_wrapped() {
        let out = reshape(json!({
            "gallery_o": { "item": { "image-url": "/a.png" } }
        }));
        assert_eq!(
            out,
            json!({ "gallery_o": { "item": [ { "image__url": "/a.png" } ] } })
        );
    }

    #[test]
    fn item_lists_are_kept_and_reshaped() {
        let out = reshape(json!({
            "links_o": { "item": [ { "key-name": "a" }, { "key-name": "b" } ] }
        }));
        assert_eq!(
            out,
            json!({ "links_o": { "item": [ { "key__name": "a" }, { "key__name": "b" } ] } })
        );
    }

    #[test]
    fn null_item_becomes_empty_list() {
        let out = reshape(json!({ "links_o": { "item": null } }));
        assert_eq!(out, json!({ "links_o": { "item": [] } }));
    }

    #[test]
    fn scalars_pass_through() {
        let out = reshape(json!({ "content-type": "/page/article", "count_i": 3 }));
        assert_eq!(out, json!({ "content__type": "/page/article", "count_i": 3 }));
    }

    #[test]
    fn reshaping_twice_changes_nothing() {
        let once = reshape(json!({
            "content-type": "/component/slide",
            "slides_o": { "item": { "title_s": "one", "nested_o": { "item": "x" } } },
        }));
        let twice = reshape(once.clone());
        assert_eq!(once, twice);
    }
}
