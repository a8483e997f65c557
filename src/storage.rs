use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use crate::error::Result;

pub const BLOCKS_KEY: &str = "blocks";
pub const CUSTOM_TEMPLATES_KEY: &str = "custom_templates";
pub const CURRENT_TEMPLATE_KEY: &str = "current_template";
pub const HIDDEN_TEMPLATES_KEY: &str = "hidden_templates";
pub const DAY_SCHEDULES_KEY: &str = "day_schedules";
pub const POMODORO_SETTINGS_KEY: &str = "pomodoro_settings";

pub const ALL_KEYS: [&str; 6] = [
    BLOCKS_KEY,
    CUSTOM_TEMPLATES_KEY,
    CURRENT_TEMPLATE_KEY,
    HIDDEN_TEMPLATES_KEY,
    DAY_SCHEDULES_KEY,
    POMODORO_SETTINGS_KEY,
];

/// Durable key-value storage for the planner's records.
///
/// Values are JSON text. Reads return `Ok(None)` for keys never written.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Returns the directory holding the data files.
///
/// The path is determined in the following order:
/// 1. `DAYRING_DATA_DIR` environment variable.
/// 2. `~/.local/share/dayring` (on Linux).
/// 3. `./dayring` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var("DAYRING_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("dayring");
        p
    })
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> JsonFileStore {
        JsonFileStore { dir: dir.into() }
    }

    /// Store rooted at [`data_dir`].
    pub fn open_default() -> JsonFileStore {
        JsonFileStore::new(data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Writes through a temporary file and renames it into place.
    fn write(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.path(key);
        let tmp_path = path.with_extension("tmp");
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Memory store whose writes can be switched off to simulate a full disk.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_writes: std::cell::Cell<bool>,
}

#[cfg(test)]
impl KeyValueStore for FlakyStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Reads and decodes `key`.
///
/// Returns `None` when the key is missing, unreadable or corrupt; the
/// caller substitutes its documented default.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value, using default");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored value is corrupt, using default");
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    store.write(key, &s)?;
    debug!(key, bytes = s.len(), "saved");
    Ok(())
}

/// Deletes every record the planner owns.
pub fn clear_all(store: &dyn KeyValueStore) -> Result<()> {
    for key in ALL_KEYS {
        store.remove(key)?;
    }
    Ok(())
}
