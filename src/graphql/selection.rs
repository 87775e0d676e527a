//! Parsed selection tree handed over by the GraphQL front end.
//!
//! The types mirror the GraphQL document AST closely enough for query
//! compilation and deserialize from a JSON encoding, e.g.
//!
//! ```json
//! { "kind": "field", "name": "title_s",
//!   "arguments": [ { "name": "filter",
//!                    "value": { "kind": "object", "value": [
//!                        { "name": "matches", "value": { "kind": "string", "value": "news" } } ] } } ] }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(pub Vec<Selection>);

impl SelectionSet {
    pub fn selections(&self) -> &[Selection] {
        &self.0
    }
}

impl From<Vec<Selection>> for SelectionSet {
    fn from(selections: Vec<Selection>) -> Self {
        Self(selections)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            selection_set: None,
        }
    }

    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selection_set = Some(SelectionSet(selections));
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value,
        });
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Literal> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    /// First direct sub-field called `name`.
    pub fn child_field(&self, name: &str) -> Option<&Field> {
        self.selection_set
            .as_ref()?
            .selections()
            .iter()
            .find_map(|selection| match selection {
                Selection::Field(field) if field.name == name => Some(field),
                _ => None,
            })
    }
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selection_set: SelectionSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpread {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selection_set: SelectionSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: Literal,
}

/// Literal argument value as written in the query document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    Null,
    Variable(String),
    List(Vec<Literal>),
    Object(Vec<ObjectField>),
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    pub fn object<N: Into<String>>(fields: impl IntoIterator<Item = (N, Literal)>) -> Self {
        Literal::Object(
            fields
                .into_iter()
                .map(|(name, value)| ObjectField {
                    name: name.into(),
                    value,
                })
                .collect(),
        )
    }

    /// Name of the literal kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "boolean",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Enum(_) => "enum",
            Literal::Null => "null",
            Literal::Variable(_) => "variable",
            Literal::List(_) => "list",
            Literal::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: String,
    pub value: Literal,
}

/// Resolves named fragments referenced by spreads.
pub trait FragmentLookup {
    fn fragment(&self, name: &str) -> Option<&FragmentDefinition>;
}

impl FragmentLookup for HashMap<String, FragmentDefinition> {
    fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.get(name)
    }
}
