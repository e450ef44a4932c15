//! Call arguments as seen by the routing layer.
//!
//! The storage abstraction's methods take heterogeneous arguments; routing
//! only needs to find the models inside them. [`CallArgs`] is therefore an
//! untyped record of named [`ArgValue`]s, deserializable straight from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Model;

/// Untyped argument value.
///
/// Models are carried as their name (`"project"`) or numeric id (`1`). Keyed
/// tuples such as `(model, key)` are carried as a `List` whose first element
/// is the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ArgValue>),
    /// Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Interprets this value as a model reference.
    ///
    /// Strings are matched against model names, integers against model ids.
    /// Anything else is not a model.
    #[must_use]
    pub fn as_model(&self) -> Option<Model> {
        match self {
            ArgValue::String(name) => Model::from_name(name),
            ArgValue::Int(id) => u32::try_from(*id).ok().and_then(Model::from_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Model> for ArgValue {
    fn from(model: Model) -> Self {
        ArgValue::String(model.name().to_string())
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(values: Vec<T>) -> Self {
        ArgValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Named arguments of a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallArgs(BTreeMap<String, ArgValue>);

impl CallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ArgValue>> FromIterator<(K, V)> for CallArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
