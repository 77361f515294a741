//! String key-value persistence, the role browser local storage plays on the web.

use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::StoreError;

/// Pluggable storage of string values under string keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored at `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Store `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    /// Remove the value at `key`. Removing a missing key is not an error.
    fn del(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.as_ref().get(key)
    }
    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.as_ref().set(key, value)
    }
    fn del(&self, key: &str) -> Result<(), StoreError> {
        self.as_ref().del(key)
    }
}

/// In-memory store suitable for short-lived runs and tests.
///
/// Clones share the same map.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore(Arc<RwLock<HashMap<SmolStr, String>>>);

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable(SmolStr::new_static("memory store lock poisoned"))
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.read().map_err(|_| poisoned())?.get(key).cloned())
    }
    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.0
            .write()
            .map_err(|_| poisoned())?
            .insert(SmolStr::new(key), value);
        Ok(())
    }
    fn del(&self, key: &str) -> Result<(), StoreError> {
        self.0.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// File-backed store: a single JSON object mapping keys to string values.
///
/// A missing or empty file reads as an empty store. Writes replace the file
/// through a sibling temp file and a rename.
#[derive(Clone, Debug)]
pub struct FileStore {
    /// Path to the JSON file.
    pub path: PathBuf,
}

impl FileStore {
    /// Create a store at `path`. Nothing is touched on disk until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Other("store file is not a JSON object".into())),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "store".into());
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.read_map()?.remove(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(StoreError::Other(
                format!("value at `{key}` is not a string").into(),
            )),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        map.insert(key.to_owned(), Value::String(value));
        self.write_map(&map)
    }

    fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("config", "{}".into()).unwrap();
        assert_eq!(other.get("config").unwrap().as_deref(), Some("{}"));
        other.del("config").unwrap();
        assert_eq!(store.get("config").unwrap(), None);
        store.del("config").unwrap();
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("store.json"));
        assert_eq!(store.get("config").unwrap(), None);
        store.del("config").unwrap();
        assert!(!store.path.exists());
    }

    #[test]
    fn file_store_round_trips_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("store.json"));
        store.set("config", "{\"a\":1}".into()).unwrap();
        store.set("theme", "dark".into()).unwrap();
        assert_eq!(store.get("config").unwrap().as_deref(), Some("{\"a\":1}"));

        let reopened = FileStore::new(&store.path);
        reopened.del("config").unwrap();
        assert_eq!(reopened.get("config").unwrap(), None);
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn file_store_rejects_non_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1,2,3]").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.get("config"), Err(StoreError::Other(_))));
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(store.get("config"), Err(StoreError::Serde(_))));
    }

    #[test]
    fn file_store_rejects_non_string_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"config": {"like": true}}"#).unwrap();
        let store = FileStore::new(&path);
        assert!(store.get("config").is_err());
    }
}
