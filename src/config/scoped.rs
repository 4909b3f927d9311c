// ABOUTME: Ordered scope-to-bytes map returned by config connectors.
// ABOUTME: Iteration runs from the most general scope to the most specific one.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedValues(IndexMap<String, Bytes>);

impl ScopedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a scope. A replaced scope keeps its position.
    pub fn insert(&mut self, scope: impl Into<String>, value: impl Into<Bytes>) {
        self.0.insert(scope.into(), value.into());
    }

    pub fn get(&self, scope: &str) -> Option<&Bytes> {
        self.0.get(scope)
    }

    pub fn remove(&mut self, scope: &str) -> Option<Bytes> {
        self.0.shift_remove(scope)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contents of the most specific scope, if any.
    pub fn last(&self) -> Option<(&str, &Bytes)> {
        self.0.last().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Bytes)> for ScopedValues {
    fn from_iter<I: IntoIterator<Item = (String, Bytes)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ScopedValues {
    type Item = (String, Bytes);
    type IntoIter = indexmap::map::IntoIter<String, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// Config files are text; render them as strings for JSON output.
impl Serialize for ScopedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (scope, value) in &self.0 {
            map.serialize_entry(scope, &String::from_utf8_lossy(value))?;
        }
        map.end()
    }
}
