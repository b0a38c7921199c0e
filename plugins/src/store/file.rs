use std::path::PathBuf;

use serde_json::{Map, Value};

use challenge_stream_core::error::StoreError;
use challenge_stream_core::settings::{decode_stored, SettingsStore};

/// Settings kept as one JSON object on disk. The file is read on every lookup so
/// edits made between runs are picked up; a missing file means no settings.
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                path: self.path.display().to_string(),
                source,
            })
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn name(&self) -> &str {
        "json_file"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(mut entries) = self.read_all()? else {
            return Ok(None);
        };
        match entries.remove(key) {
            Some(value) => decode_stored(key, value),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_string_encoded_and_plain_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            json!({
                "challenge_model_config": "{\"model\":\"flash\",\"temperature\":0.2}",
                "theme": {"dark": true}
            })
            .to_string(),
        )
        .unwrap();

        let store = JsonFileSettingsStore::new(&path);
        assert_eq!(
            store.get("challenge_model_config").unwrap(),
            Some(json!({"model": "flash", "temperature": 0.2}))
        );
        assert_eq!(store.get("theme").unwrap(), Some(json!({"dark": true})));
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn missing_or_empty_file_means_no_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("challenge_model_config").unwrap(), None);

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(JsonFileSettingsStore::new(empty).get("k").unwrap(), None);
    }

    #[test]
    fn non_object_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = JsonFileSettingsStore::new(&path).get("k").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
