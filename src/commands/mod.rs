//! Command-line handlers for the settings surface.
//!
//! There is no long-running daemon behind these commands: each one opens the
//! storage partitions under the config directory, performs its change through
//! a freshly started [`Background`] (so writes follow the same path a live
//! settings popup would take), and exits.

pub mod get;
pub mod help;
pub mod preset;
pub mod reset;
pub mod set;
pub mod simulate;
pub mod status;
pub mod todos;

use anyhow::Result;
use std::sync::Arc;

use crate::background::Background;
use crate::config::Field;
use crate::config::loading::{open_local_area, open_sync_area};
use crate::messaging::Message;
use crate::runtime::Browser;
use crate::storage::StorageArea;
use crate::time_source;

/// The two on-disk partitions.
pub(crate) struct Partitions {
    pub local: Arc<dyn StorageArea>,
    pub sync: Arc<dyn StorageArea>,
}

impl Partitions {
    pub fn open() -> Result<Self> {
        Ok(Self {
            local: Arc::new(open_local_area()?),
            sync: Arc::new(open_sync_area()?),
        })
    }
}

/// Deliver a settings-surface message to a background over `local`.
///
/// No browser is attached, so broadcasts find no tabs and only the
/// persisted state changes.
pub(crate) fn send_settings_message(local: Arc<dyn StorageArea>, message: Message) {
    let now = time_source::now_millis();
    let mut background = Background::new(local);
    background.start(now);
    let mut no_tabs = Browser::new();
    background.handle_message(message, None, &mut no_tabs, now);
}

/// Resolve a field name, logging a suggestion when it is unknown.
pub(crate) fn resolve_field(name: &str) -> Option<Field> {
    let field = Field::parse(name);
    if field.is_none() {
        log_error!("Unknown field '{}'", name);
        let names: Vec<String> = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        if let Some(closest) = find_similar(name, &names, 1).first() {
            log_indented!("Did you mean '{}'?", closest);
        }
    }
    field
}

fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len2 = s2_chars.len();

    let mut previous: Vec<usize> = (0..=len2).collect();
    for (i, a) in s1_chars.iter().enumerate() {
        let mut current = vec![i + 1; len2 + 1];
        for (j, b) in s2_chars.iter().enumerate() {
            let cost = usize::from(a != b);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[len2]
}

/// The `max_count` candidates closest to `target` (case-insensitive).
pub(crate) fn find_similar(target: &str, candidates: &[String], max_count: usize) -> Vec<String> {
    let target = target.to_lowercase();
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .map(|c| (levenshtein_distance(&target, &c.to_lowercase()), c))
        .collect();
    scored.sort_by_key(|(distance, _)| *distance);
    scored
        .into_iter()
        .take(max_count)
        .map(|(_, c)| c.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("blur", "blur"), 0);
    }

    #[test]
    fn test_find_similar_prefers_closest() {
        let names: Vec<String> = ["max_levels", "blur_enabled", "level_interval_minutes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_similar("max_level", &names, 1), vec!["max_levels"]);
        assert_eq!(find_similar("BLUR_ENABLE", &names, 1), vec!["blur_enabled"]);
        assert!(find_similar("x", &[], 1).is_empty());
    }
}
