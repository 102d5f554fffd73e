//! # Template variables module

use std::collections::BTreeMap;

use minijinja::Value;
use serde::Serialize;

/// The variable context templates are rendered against.
///
/// Keys are kept ordered so that rendering the same template with the
/// same variables always gives the same output.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, replacing and returning the previous value
    /// if any.
    pub fn insert(&mut self, key: impl ToString, val: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.to_string(), val.into())
    }

    pub fn with(mut self, key: impl ToString, val: impl Into<Value>) -> Self {
        self.insert(key, val);
        self
    }

    /// Insert any serializable value as a variable.
    pub fn insert_serialize<T: Serialize>(&mut self, key: impl ToString, val: &T) -> Option<Value> {
        self.insert(key, Value::from_serialize(val))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for Variables {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, val)| (key.to_string(), val.into()))
                .collect(),
        )
    }
}

impl<K: ToString, V: Into<Value>> Extend<(K, V)> for Variables {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, val) in iter {
            self.insert(key, val);
        }
    }
}
