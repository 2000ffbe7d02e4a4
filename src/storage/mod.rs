//! Key-value storage partitions.
//!
//! Two partitions exist: **local** (options and session statistics, per
//! device) and **sync** (the custom checklist text list). Both are plain
//! JSON-valued key-value stores behind [`StorageArea`]; the CLI uses
//! [`JsonFileArea`], simulations and tests use [`MemoryArea`].
//!
//! Writes are last-write-wins. There is no transaction or version check.

pub mod file;

use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::config::Options;
use crate::constants::{CUSTOM_TODOS_KEY, DEFAULT_CHECKLIST_ITEMS, OPTIONS_KEY};

pub use file::JsonFileArea;

/// One storage partition.
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Short name for log lines ("local", "sync", a file path, ...).
    fn label(&self) -> String;
}

/// In-process partition.
#[derive(Debug, Default)]
pub struct MemoryArea {
    label: String,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryArea {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageArea for MemoryArea {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// Read options, defaulting every field that is missing or malformed.
///
/// Storage read failures also fall back to defaults; each problem is logged
/// as a warning.
pub fn load_options(area: &dyn StorageArea) -> Options {
    let stored = match area.get(OPTIONS_KEY) {
        Ok(stored) => stored,
        Err(e) => {
            log_warning!("Could not read options from {}: {e:#}", area.label());
            None
        }
    };
    let Some(stored) = stored else {
        return Options::default();
    };
    Options::resolve(&stored)
}

/// Overwrite the stored options record.
pub fn save_options(area: &dyn StorageArea, options: &Options) -> Result<()> {
    area.set(OPTIONS_KEY, options.to_json())
}

/// Stored custom checklist, `None` when absent or unusable.
pub fn load_custom_todos(area: &dyn StorageArea) -> Result<Option<Vec<String>>> {
    let Some(value) = area.get(CUSTOM_TODOS_KEY)? else {
        return Ok(None);
    };
    let Some(items) = value.as_array() else {
        log_warning!("Ignoring custom checklist in {}: not a list", area.label());
        return Ok(None);
    };
    Ok(Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    ))
}

pub fn save_custom_todos(area: &dyn StorageArea, todos: &[String]) -> Result<()> {
    area.set(CUSTOM_TODOS_KEY, Value::from(todos.to_vec()))
}

/// Checklist items to show: the custom list when present and non-empty,
/// else the built-in defaults.
pub fn checklist_items(area: &dyn StorageArea) -> Vec<String> {
    match load_custom_todos(area) {
        Ok(Some(todos)) if !todos.is_empty() => todos,
        Ok(_) => default_checklist_items(),
        Err(e) => {
            log_warning!("Could not read custom checklist: {e:#}");
            default_checklist_items()
        }
    }
}

pub fn default_checklist_items() -> Vec<String> {
    DEFAULT_CHECKLIST_ITEMS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_area_roundtrip_and_remove() {
        let area = MemoryArea::new("local");
        assert_eq!(area.get("k").unwrap(), None);
        area.set("k", json!({"a": 1})).unwrap();
        assert_eq!(area.get("k").unwrap(), Some(json!({"a": 1})));
        area.remove("k").unwrap();
        assert!(area.is_empty());
    }

    #[test]
    fn test_load_options_defaults_when_missing() {
        let area = MemoryArea::new("local");
        assert_eq!(load_options(&area), Options::default());
    }

    #[test]
    fn test_load_options_keeps_valid_fields() {
        let area = MemoryArea::new("local");
        area.set(
            OPTIONS_KEY,
            json!({"levelInterval": 3, "maxLevels": "bogus", "enableBlur": false}),
        )
        .unwrap();

        let options = load_options(&area);
        assert_eq!(options.level_interval_minutes, 3.0);
        assert_eq!(options.max_levels, Options::default().max_levels);
        assert!(!options.blur_enabled);
    }

    #[test]
    fn test_checklist_items_fallbacks() {
        let area = MemoryArea::new("sync");
        assert_eq!(checklist_items(&area).len(), 8);

        save_custom_todos(&area, &[]).unwrap();
        assert_eq!(checklist_items(&area), default_checklist_items());

        save_custom_todos(&area, &["Stretch".to_string()]).unwrap();
        assert_eq!(checklist_items(&area), vec!["Stretch".to_string()]);
    }

    #[test]
    fn test_non_list_custom_todos_ignored() {
        let area = MemoryArea::new("sync");
        area.set(CUSTOM_TODOS_KEY, json!("Stretch")).unwrap();
        assert_eq!(load_custom_todos(&area).unwrap(), None);
    }
}
