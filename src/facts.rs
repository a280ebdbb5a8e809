//! Read-only access to previously collected facts.
//!
//! Facts are gathered by collection plugins before any breach is rendered.
//! Templates reach them through the `lookup` family of functions; during
//! rendering the store is only ever read.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{BreachError, Result};

/// Source of fact data keyed by fact identifier.
pub trait FactSource: Send + Sync {
    /// Return the data collected for `id`, if any.
    fn fact(&self, id: &str) -> Option<&JsonValue>;

    /// Look up `key` inside the fact `id`.
    ///
    /// Works for flat maps (`{"key1": "value1"}`) and nested maps
    /// (`{"file.yml": {"content": "..."}}`). A direct key match wins; otherwise
    /// a dotted key is walked segment by segment.
    fn lookup(&self, id: &str, key: &str) -> Option<&JsonValue> {
        let data = self.fact(id)?;
        let map = data.as_object()?;
        if let Some(v) = map.get(key) {
            return Some(v);
        }
        if !key.contains('.') {
            return None;
        }
        let mut current = data;
        for segment in key.split('.') {
            current = match current {
                JsonValue::Object(m) => m.get(segment)?,
                JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A source with no facts; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFacts;

impl FactSource for NoFacts {
    fn fact(&self, _id: &str) -> Option<&JsonValue> {
        None
    }
}

/// In-memory fact store filled during the collection phase.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    facts: IndexMap<String, JsonValue>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the data collected for a fact, replacing any previous value.
    pub fn insert(&mut self, id: impl Into<String>, data: JsonValue) {
        self.facts.insert(id.into(), data);
    }

    #[must_use]
    pub fn with_fact(mut self, id: impl Into<String>, data: JsonValue) -> Self {
        self.insert(id, data);
        self
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    /// Parse a JSON object mapping fact identifiers to their data.
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<JsonValue>(json)? {
            JsonValue::Object(map) => Ok(map.into_iter().collect()),
            other => Err(BreachError::invalid_value(
                "facts",
                format!("expected an object keyed by fact id, got {}", json_kind(&other)),
            )),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

impl FactSource for FactStore {
    fn fact(&self, id: &str) -> Option<&JsonValue> {
        self.facts.get(id)
    }
}

impl FromIterator<(String, JsonValue)> for FactStore {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_str() {
        let store = FactStore::from_json_str(r#"{"versions": {"php": "8.3"}, "files": ["a"]}"#).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("versions", "php"), Some(&json!("8.3")));
        assert!(store.ids().any(|id| id == "files"));

        let err = FactStore::from_json_str("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("invalid value"), "{err}");
    }

    fn store() -> FactStore {
        FactStore::new()
            .with_fact("string-map-fact", json!({"key1": "value1"}))
            .with_fact("interface-map-fact", json!({"name": "John Doe", "age": 30}))
            .with_fact(
                "nested-fact",
                json!({"file1.log": {"content": "error occurred"}, "site": {"modules": ["a", "b"]}}),
            )
    }

    #[test]
    fn test_flat_lookup() {
        let facts = store();
        assert_eq!(facts.lookup("string-map-fact", "key1"), Some(&json!("value1")));
        assert_eq!(facts.lookup("interface-map-fact", "age"), Some(&json!(30)));
        assert_eq!(facts.lookup("string-map-fact", "missing"), None);
        assert_eq!(facts.lookup("missing-fact", "key1"), None);
    }

    #[test]
    fn test_nested_lookup_prefers_direct_key() {
        let facts = store();
        assert_eq!(
            facts.lookup("nested-fact", "file1.log"),
            Some(&json!({"content": "error occurred"}))
        );
        assert_eq!(facts.lookup("nested-fact", "site.modules.1"), Some(&json!("b")));
        assert_eq!(facts.lookup("nested-fact", "site.missing"), None);
    }

    #[test]
    fn test_non_map_fact_lookup_misses() {
        let facts = FactStore::new().with_fact("list", json!(["a", "b"]));
        assert_eq!(facts.lookup("list", "0"), None);
        assert!(facts.fact("list").is_some());
    }

    #[test]
    fn test_no_facts() {
        assert_eq!(NoFacts.lookup("any", "key"), None);
    }
}
