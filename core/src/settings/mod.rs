//! Read-only view of the local key-value settings store.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::StoreError;

pub trait SettingsStore: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
}

/// Normalises a stored value. Browser-style stores keep JSON documents as strings, so a
/// string is parsed as JSON; `null` counts as absent.
pub fn decode_stored(key: &str, value: Value) -> Result<Option<Value>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => serde_json::from_str::<Value>(&s)
            .map(|v| (!v.is_null()).then_some(v))
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
        other => Ok(Some(other)),
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    entries: HashMap<String, Value>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.entries.get(key) {
            Some(v) => decode_stored(key, v.clone()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_values_are_parsed_as_json() {
        let store = MemorySettingsStore::new()
            .with("challenge_model_config", json!("{\"model\":\"flash\"}"))
            .with("plain", json!({"model": "pro"}))
            .with("empty", json!(null))
            .with("broken", json!("{not json"));

        assert_eq!(
            store.get("challenge_model_config").unwrap(),
            Some(json!({"model": "flash"}))
        );
        assert_eq!(store.get("plain").unwrap(), Some(json!({"model": "pro"})));
        assert_eq!(store.get("empty").unwrap(), None);
        assert_eq!(store.get("missing").unwrap(), None);
        assert!(matches!(
            store.get("broken"),
            Err(StoreError::Decode { ref key, .. }) if key == "broken"
        ));
    }
}
