//! Persistence for the two small user preferences: search history and the
//! display unit.
//!
//! Loads never fail. Missing or malformed documents fall back to defaults and
//! are logged.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;

use crate::units::TemperatureUnit;

pub const HISTORY_FILE: &str = "search_history.json";
pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize {document}: {source}")]
    Serialize {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub trait PreferenceStore: Send + Sync {
    fn load_history(&self) -> Vec<String>;
    fn save_history(&self, history: &[String]) -> Result<(), StoreError>;
    fn load_unit(&self) -> TemperatureUnit;
    fn save_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn load_history(&self) -> Vec<String> {
        (**self).load_history()
    }

    fn save_history(&self, history: &[String]) -> Result<(), StoreError> {
        (**self).save_history(history)
    }

    fn load_unit(&self) -> TemperatureUnit {
        (**self).load_unit()
    }

    fn save_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError> {
        (**self).save_unit(unit)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesDocument {
    unit: TemperatureUnit,
}

/// Stores each preference as a JSON document inside one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    fn preferences_path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }

    fn read_document<T>(path: &Path) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Could not read preference file, using default"
                );
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Malformed preference file, using default"
                );
                None
            }
        }
    }

    /// Write to a sibling temp file and rename it over the target, so a
    /// concurrent load sees either the old or the new document.
    fn write_document<T: Serialize>(
        &self,
        path: &Path,
        document: &'static str,
        value: &T,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Serialize { document, source })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn load_history(&self) -> Vec<String> {
        Self::read_document(&self.history_path()).unwrap_or_default()
    }

    fn save_history(&self, history: &[String]) -> Result<(), StoreError> {
        self.write_document(&self.history_path(), "search history", &history)
    }

    fn load_unit(&self) -> TemperatureUnit {
        Self::read_document::<PreferencesDocument>(&self.preferences_path())
            .map(|doc| doc.unit)
            .unwrap_or_default()
    }

    fn save_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError> {
        let document = PreferencesDocument { unit };
        self.write_document(&self.preferences_path(), "preferences", &document)
    }
}

/// Keeps preferences in memory only. Useful for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<Vec<String>>,
    unit: Mutex<TemperatureUnit>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            history: Mutex::new(entries.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

fn lock<T>(value: &Mutex<T>) -> MutexGuard<'_, T> {
    value.lock().unwrap_or_else(|e| e.into_inner())
}

impl PreferenceStore for MemoryStore {
    fn load_history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    fn save_history(&self, history: &[String]) -> Result<(), StoreError> {
        *lock(&self.history) = history.to_vec();
        Ok(())
    }

    fn load_unit(&self) -> TemperatureUnit {
        *lock(&self.unit)
    }

    fn save_unit(&self, unit: TemperatureUnit) -> Result<(), StoreError> {
        *lock(&self.unit) = unit;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("not-created-yet"));

        assert!(store.load_history().is_empty());
        assert_eq!(store.load_unit(), TemperatureUnit::Celsius);
    }

    #[test]
    fn history_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let cities = vec!["Tokyo".to_string(), "London".to_string()];
        store.save_history(&cities).unwrap();

        assert_eq!(store.load_history(), cities);
        assert!(!dir.path().join("search_history.json.tmp").exists());
    }

    #[test]
    fn history_is_a_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_history(&["Oslo".to_string()]).unwrap();

        let raw = fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, ["Oslo"]);
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save_history(&["A", "B", "C"].map(String::from)).unwrap();
        store.save_history(&["Z".to_string()]).unwrap();

        assert_eq!(store.load_history(), ["Z"]);
    }

    #[test]
    fn malformed_history_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HISTORY_FILE), "{not json").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn unit_preference_uses_letter_codes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save_unit(TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(store.load_unit(), TemperatureUnit::Fahrenheit);

        let raw = fs::read_to_string(dir.path().join(PREFERENCES_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["unit"], "F");
    }

    #[test]
    fn malformed_unit_falls_back_to_celsius() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PREFERENCES_FILE), r#"{"unit":"K"}"#).unwrap();

        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.load_unit(), TemperatureUnit::Celsius);
    }

    #[test]
    fn memory_store_keeps_values() {
        let store = MemoryStore::with_history(["Rome"]);
        assert_eq!(store.load_history(), ["Rome"]);

        store.save_unit(TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(store.load_unit(), TemperatureUnit::Fahrenheit);
    }
}
