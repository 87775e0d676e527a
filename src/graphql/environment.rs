use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::selection::{Field, FragmentDefinition, FragmentLookup, Literal};

/// Everything the front end resolved for one top-level query field.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEnvironment {
    /// The queried field, e.g. `page_article` or `contentItems`.
    pub field: Field,
    /// Argument values after variable substitution.
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default)]
    pub fragments: HashMap<String, FragmentDefinition>,
}

impl QueryEnvironment {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            arguments: Map::new(),
            fragments: HashMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_fragment(mut self, name: impl Into<String>, fragment: FragmentDefinition) -> Self {
        self.fragments.insert(name.into(), fragment);
        self
    }

    /// Resolved value of an argument, falling back to the literal written on the
    /// field when the front end did not resolve it.
    pub fn argument(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.arguments.get(name) {
            return (!value.is_null()).then(|| value.clone());
        }

        match self.field.argument(name)? {
            Literal::Boolean(value) => Some(Value::Bool(*value)),
            Literal::Int(value) => Some(Value::from(*value)),
            Literal::Float(value) => serde_json::Number::from_f64(*value).map(Value::Number),
            Literal::String(value) | Literal::Enum(value) => Some(Value::String(value.clone())),
            _ => None,
        }
    }

    pub fn fragments(&self) -> &dyn FragmentLookup {
        &self.fragments
    }
}
