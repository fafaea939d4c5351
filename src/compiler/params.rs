//! Query parameter bag
//!
//! One bag per batch. Every literal in rendered text is bound here and
//! referenced by its `$key` placeholder.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Bound parameters for one batch of statements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamBag {
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    next: usize,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value under a fresh key and returns its placeholder
    pub fn bind(&mut self, value: Value) -> String {
        let key = loop {
            let candidate = format!("p{}", self.next);
            self.next += 1;
            if !self.values.contains_key(&candidate) {
                break candidate;
            }
        };
        let placeholder = format!("${}", key);
        self.values.insert(key, value);
        placeholder
    }

    /// Binds a caller-chosen key. Returns false and leaves the bag unchanged
    /// if the key is already bound.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        match self.values.entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// JSON object form sent to the transport
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_returns_fresh_placeholders() {
        let mut bag = ParamBag::new();
        assert_eq!(bag.bind(json!("a")), "$p0");
        assert_eq!(bag.bind(json!("a")), "$p1");
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("p1"), Some(&json!("a")));
    }

    #[test]
    fn test_bind_skips_taken_keys() {
        let mut bag = ParamBag::new();
        assert!(bag.insert("p0", json!(1)));
        assert!(bag.insert("p1", json!(2)));
        assert_eq!(bag.bind(json!(3)), "$p2");
        assert_eq!(bag.get("p0"), Some(&json!(1)));
    }

    #[test]
    fn test_insert_never_replaces_bound_value() {
        let mut bag = ParamBag::new();
        let placeholder = bag.bind(json!("bound"));
        assert_eq!(placeholder, "$p0");
        assert!(!bag.insert("p0", json!("other")));
        assert_eq!(bag.get("p0"), Some(&json!("bound")));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_serializes_as_object() {
        let mut bag = ParamBag::new();
        bag.bind(json!("x"));
        assert_eq!(serde_json::to_value(&bag).unwrap(), json!({ "p0": "x" }));
        assert_eq!(bag.to_value(), json!({ "p0": "x" }));
    }
}
