//! Filter operators available on leaf fields.
//!
//! Each entry of a field's `filter` object names an operator; the registry maps
//! that name to a builder producing one clause anchored at the field's path.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::search::{Clause, RangeBound};

use super::schema::{
    ARG_NAME_EQUALS, ARG_NAME_EXISTS, ARG_NAME_GT, ARG_NAME_GTE, ARG_NAME_LT, ARG_NAME_LTE,
    ARG_NAME_MATCHES, ARG_NAME_REGEX,
};
use super::selection::Literal;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),
    #[error("`{operator}` does not accept a {kind} literal")]
    UnsupportedLiteral {
        operator: String,
        kind: &'static str,
    },
}

/// Where a compiled clause goes in the boolean query.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPlacement {
    Filter(Clause),
    MustNot(Clause),
}

type OperatorFn = fn(&str, Value) -> Option<FilterPlacement>;

/// Operator name → clause builder. A builder returns `None` when the decoded
/// literal is of the wrong shape for it.
pub static OPERATORS: Lazy<HashMap<&'static str, OperatorFn>> = Lazy::new(|| {
    let mut operators: HashMap<&'static str, OperatorFn> = HashMap::new();
    operators.insert(ARG_NAME_EQUALS, |path, value| {
        Some(FilterPlacement::Filter(Clause::Term {
            field: path.to_string(),
            value,
        }))
    });
    operators.insert(ARG_NAME_MATCHES, |path, value| {
        Some(FilterPlacement::Filter(Clause::Match {
            field: path.to_string(),
            value,
        }))
    });
    operators.insert(ARG_NAME_REGEX, |path, value| {
        let pattern = match value {
            Value::String(pattern) => pattern,
            other => other.to_string(),
        };
        Some(FilterPlacement::Filter(Clause::Regexp {
            field: path.to_string(),
            pattern,
        }))
    });
    operators.insert(ARG_NAME_LT, |path, value| range(path, RangeBound::Lt, value));
    operators.insert(ARG_NAME_GT, |path, value| range(path, RangeBound::Gt, value));
    operators.insert(ARG_NAME_LTE, |path, value| range(path, RangeBound::Lte, value));
    operators.insert(ARG_NAME_GTE, |path, value| range(path, RangeBound::Gte, value));
    operators.insert(ARG_NAME_EXISTS, |path, value| {
        let clause = Clause::Exists {
            field: path.to_string(),
        };
        match value {
            Value::Bool(true) => Some(FilterPlacement::Filter(clause)),
            Value::Bool(false) => Some(FilterPlacement::MustNot(clause)),
            _ => None,
        }
    });
    operators
});

fn range(path: &str, bound: RangeBound, value: Value) -> Option<FilterPlacement> {
    Some(FilterPlacement::Filter(Clause::Range {
        field: path.to_string(),
        bound,
        value,
    }))
}

/// Decode a scalar literal; `None` for every kind without a usable scalar value.
pub fn decode_literal(literal: &Literal) -> Option<Value> {
    match literal {
        Literal::Boolean(value) => Some(Value::Bool(*value)),
        Literal::Float(value) => Number::from_f64(*value).map(Value::Number),
        Literal::Int(value) => Some(Value::Number((*value).into())),
        Literal::String(value) => Some(Value::String(value.clone())),
        Literal::Enum(_)
        | Literal::Null
        | Literal::Variable(_)
        | Literal::List(_)
        | Literal::Object(_) => None,
    }
}

/// Compile one `operator: literal` entry of a filter object at `path`.
pub fn compile(path: &str, operator: &str, literal: &Literal) -> Result<FilterPlacement, FilterError> {
    let build = OPERATORS
        .get(operator)
        .ok_or_else(|| FilterError::UnknownOperator(operator.to_string()))?;
    let unsupported = || FilterError::UnsupportedLiteral {
        operator: operator.to_string(),
        kind: literal.kind(),
    };

    let value = decode_literal(literal).ok_or_else(unsupported)?;
    build(path, value).ok_or_else(unsupported)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn equals_and_matches_anchor_at_path() {
        assert_eq!(
            compile("author.name_s", "equals", &Literal::string("Jane")),
            Ok(FilterPlacement::Filter(Clause::Term {
                field: "author.name_s".to_string(),
                value: json!("Jane"),
            }))
        );
        assert_eq!(
            compile("title_t", "matches", &Literal::string("news")),
            Ok(FilterPlacement::Filter(Clause::Match {
                field: "title_t".to_string(),
                value: json!("news"),
            }))
        );
    }

    #[test]
    fn range_operators_keep_numeric_literals() {
        assert_eq!(
            compile("price_i", "lte", &Literal::Int(20)),
            Ok(FilterPlacement::Filter(Clause::Range {
                field: "price_i".to_string(),
                bound: RangeBound::Lte,
                value: json!(20),
            }))
        );
        assert_eq!(
            compile("score_f", "gt", &Literal::Float(0.5)),
            Ok(FilterPlacement::Filter(Clause::Range {
                field: "score_f".to_string(),
                bound: RangeBound::Gt,
                value: json!(0.5),
            }))
        );
    }

    #[test]
    fn regex_stringifies_non_string_literals() {
        assert_eq!(
            compile("code_s", "regex", &Literal::Int(42)),
            Ok(FilterPlacement::Filter(Clause::Regexp {
                field: "code_s".to_string(),
                pattern: "42".to_string(),
            }))
        );
    }

    #[test]
    fn exists_false_is_negated() {
        let clause = Clause::Exists {
            field: "image_s".to_string(),
        };
        assert_eq!(
            compile("image_s", "exists", &Literal::Boolean(true)),
            Ok(FilterPlacement::Filter(clause.clone()))
        );
        assert_eq!(
            compile("image_s", "exists", &Literal::Boolean(false)),
            Ok(FilterPlacement::MustNot(clause))
        );
    }

    #[test]
    fn exists_requires_boolean() {
        assert_eq!(
            compile("image_s", "exists", &Literal::string("yes")),
            Err(FilterError::UnsupportedLiteral {
                operator: "exists".to_string(),
                kind: "string",
            })
        );
    }

    #[test]
    fn unrecognized_literal_kinds_have_no_value() {
        assert_eq!(decode_literal(&Literal::Enum("DESC".to_string())), None);
        assert_eq!(decode_literal(&Literal::Null), None);
        assert_eq!(decode_literal(&Literal::Variable("q".to_string())), None);
        assert_eq!(
            compile("title_t", "equals", &Literal::List(vec![])),
            Err(FilterError::UnsupportedLiteral {
                operator: "equals".to_string(),
                kind: "list",
            })
        );
    }

    #[test]
    fn unknown_operator_is_reported() {
        assert_eq!(
            compile("title_t", "near", &Literal::string("x")),
            Err(FilterError::UnknownOperator("near".to_string()))
        );
    }

    #[test]
    fn registry_covers_every_operator() {
        for name in ["equals", "matches", "regex", "lt", "gt", "lte", "gte", "exists"] {
            assert!(OPERATORS.contains_key(name), "missing operator {name}");
        }
        assert_eq!(OPERATORS.len(), 8);
    }
}
