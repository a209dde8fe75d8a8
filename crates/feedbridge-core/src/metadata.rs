//! Message metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::Fields;

/// Ordered key/value metadata attached to a domain message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates metadata holding a single key.
    #[must_use]
    pub fn kv(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(key.into(), value.into());
        Self(values)
    }

    /// Returns a copy with `other`'s keys layered on top.
    #[must_use]
    pub fn merge(&self, other: &Metadata) -> Self {
        let mut values = self.0.clone();
        values.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(values)
    }

    /// Looks up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes to the flat mapping the store persists.
    #[must_use]
    pub fn serialize(&self) -> Fields {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Rebuilds metadata from a stored mapping.
    #[must_use]
    pub fn deserialize(fields: Fields) -> Self {
        Self(fields.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Metadata;

    #[test]
    fn test_merge_prefers_right_hand_keys() {
        let base = Metadata::kv("source", "api").merge(&Metadata::kv("user", "alice"));

        let merged = base.merge(&Metadata::kv("source", "batch"));

        assert_eq!(merged.get("source"), Some(&json!("batch")));
        assert_eq!(merged.get("user"), Some(&json!("alice")));
        assert_eq!(base.get("source"), Some(&json!("api")));
    }

    #[test]
    fn test_serialize_then_deserialize_keeps_all_keys() {
        let metadata = Metadata::kv("trace", json!({"id": 9})).merge(&Metadata::kv("n", 1));

        let restored = Metadata::deserialize(metadata.serialize());

        assert_eq!(restored, metadata);
        assert!(!restored.is_empty());
    }
}
