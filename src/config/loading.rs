//! Location of the storage partitions on disk.
//!
//! By default both partitions live in `$XDG_CONFIG_HOME/detoxr/`. The
//! `--config <dir>` flag overrides the directory once per process.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::constants::{LOCAL_STORE_FILE, SYNC_STORE_FILE};
use crate::storage::JsonFileArea;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// Returns an error if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The custom directory, if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Directory holding `local.json` and `sync.json`.
pub fn config_base_dir() -> Result<PathBuf> {
    if let Some(dir) = get_custom_config_dir() {
        return Ok(dir);
    }
    dirs::config_dir()
        .map(|dir| dir.join("detoxr"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

pub fn local_store_path() -> Result<PathBuf> {
    Ok(config_base_dir()?.join(LOCAL_STORE_FILE))
}

pub fn sync_store_path() -> Result<PathBuf> {
    Ok(config_base_dir()?.join(SYNC_STORE_FILE))
}

/// Open the local partition (options, sessions).
pub fn open_local_area() -> Result<JsonFileArea> {
    Ok(JsonFileArea::new(local_store_path()?))
}

/// Open the sync partition (custom checklist).
pub fn open_sync_area() -> Result<JsonFileArea> {
    Ok(JsonFileArea::new(sync_store_path()?))
}

/// Replace a leading home directory with `~` for display.
pub fn path_for_display(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}
