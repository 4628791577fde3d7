use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::I18nError;

/// Where the last explicitly chosen language code lives between sessions.
pub trait PreferenceStore {
    /// Stored code, if any. Read failures are logged and treated as absent.
    fn load(&self) -> Option<String>;

    fn save(&self, code: &str) -> Result<(), I18nError>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    value: Mutex<Option<String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(code: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(code.into())),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, code: &str) -> Result<(), I18nError> {
        let mut guard = self
            .value
            .lock()
            .map_err(|_| I18nError::Preferences("preference lock poisoned".to_string()))?;
        *guard = Some(code.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    language: Option<String>,
}

/// JSON file holding `{"language": "<code>"}`.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn load(&self) -> Option<String> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read preferences at {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<PreferenceFile>(&data) {
            Ok(file) => file.language,
            Err(e) => {
                warn!("Ignoring malformed preferences at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, code: &str) -> Result<(), I18nError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = PreferenceFile {
            language: Some(code.to_string()),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryPreferences::new();
        assert_eq!(store.load(), None);
        store.save("zh-TW").unwrap();
        assert_eq!(store.load().as_deref(), Some("zh-TW"));
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferences::new(dir.path().join("nested").join("prefs.json"));
        assert_eq!(store.load(), None);

        store.save("zh-CN").unwrap();
        assert_eq!(store.load().as_deref(), Some("zh-CN"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"language\""));
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let store = FilePreferences::new(&path);
        assert_eq!(store.load(), None);
    }
}
