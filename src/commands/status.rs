//! Status command: effective options, active preset and per-site usage.
//!
//! This is what the settings popup shows when opened.

use anyhow::Result;

use super::Partitions;
use crate::config::TimingPreset;
use crate::config::loading::{config_base_dir, path_for_display};
use crate::session::SessionStore;
use crate::storage::{load_custom_todos, load_options};

pub fn handle_status_command() -> Result<()> {
    log_version!();

    let partitions = Partitions::open()?;
    let options = load_options(partitions.local.as_ref());
    let mut sessions = SessionStore::new(partitions.local.clone());
    sessions.load();

    log_block_start!("Storage: {}", path_for_display(&config_base_dir()?));

    options.log_options();
    match TimingPreset::detect(&options) {
        Some(preset) => log_indented!("Preset: {}", preset),
        None => log_indented!("Preset: custom"),
    }

    log_block_start!("Usage");
    if sessions.is_empty() {
        log_indented!("No activity recorded yet");
    }
    for (domain, record) in sessions.records() {
        log_indented!(
            "{}: {} min, {} video(s)",
            domain,
            record.total_minutes(),
            record.videos_watched_count
        );
    }

    let custom = load_custom_todos(partitions.sync.as_ref()).unwrap_or_else(|e| {
        log_warning!("Could not read custom checklist: {e:#}");
        None
    });
    match custom {
        Some(todos) if !todos.is_empty() => {
            log_block_start!("Checklist: {} custom item(s)", todos.len())
        }
        _ => log_block_start!("Checklist: built-in defaults"),
    }

    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("status - Show options and per-site usage");
    log_block_start!("Usage: detoxr status");
    log_block_start!("Description:");
    log_indented!("Lists every option with its current value, the timing preset");
    log_indented!("those values match, and the minutes and videos counted per site.");
    log_indented!("Running detoxr with no command shows the same overview.");
    log_end!();
}
