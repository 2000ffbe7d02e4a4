//! JSON-file backed storage partition.
//!
//! Each partition is a single JSON object on disk. Every access takes an
//! `fs2` lock on a sidecar lock file in the same directory (shared for reads,
//! exclusive for read-modify-write) and writes go through a temporary file
//! that is renamed over the original, so a crash never leaves a torn file.

use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StorageArea;
use crate::constants::STORE_LOCK_FILE;

pub struct JsonFileArea {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileArea {
    /// Partition stored at `path`. The parent directory is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path
            .parent()
            .map(|dir| dir.join(STORE_LOCK_FILE))
            .unwrap_or_else(|| PathBuf::from(STORE_LOCK_FILE));
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(dir) = self.lock_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file {}", self.lock_path.display()))
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} does not contain a JSON object", self.path.display()),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        let content = serde_json::to_string_pretty(map)?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", self.lock_path.display()))?;
        let result = self.read_map().and_then(|mut map| {
            f(&mut map);
            self.write_map(&map)
        });
        let _ = lock.unlock();
        result
    }
}

impl StorageArea for JsonFileArea {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let lock = self.open_lock()?;
        lock.lock_shared()
            .with_context(|| format!("Failed to lock {}", self.lock_path.display()))?;
        let result = self.read_map().map(|mut map| map.remove(key));
        let _ = lock.unlock();
        result
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.modify(|map| {
            map.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|map| {
            map.remove(key);
        })
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let area = JsonFileArea::new(dir.path().join("local.json"));
        assert_eq!(area.get("options").unwrap(), None);
    }

    #[test]
    fn test_set_preserves_other_keys() {
        let dir = tempdir().unwrap();
        let area = JsonFileArea::new(dir.path().join("local.json"));
        area.set("options", json!({"maxLevels": 3})).unwrap();
        area.set("sessions", json!({})).unwrap();

        let reopened = JsonFileArea::new(dir.path().join("local.json"));
        assert_eq!(
            reopened.get("options").unwrap(),
            Some(json!({"maxLevels": 3}))
        );
        assert_eq!(reopened.get("sessions").unwrap(), Some(json!({})));
        assert!(dir.path().join(STORE_LOCK_FILE).exists());
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let area = JsonFileArea::new(dir.path().join("nested").join("sync.json"));
        area.set("customTodos", json!(["Stretch"])).unwrap();
        assert!(area.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "{not json").unwrap();
        let area = JsonFileArea::new(&path);
        assert!(area.get("options").is_err());
        assert!(area.set("options", json!({})).is_err());
    }
}
