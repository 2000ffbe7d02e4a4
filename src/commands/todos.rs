//! Todos command: manage the custom pre-leave checklist.
//!
//! The list lives in the sync partition. An absent or empty list means the
//! built-in defaults are shown.

use anyhow::Result;

use super::Partitions;
use crate::args::TodosAction;
use crate::storage::{StorageArea, checklist_items, load_custom_todos, save_custom_todos};

/// Apply `action` to the stored list; returns the list now in effect.
pub fn apply(area: &dyn StorageArea, action: &TodosAction) -> Result<Vec<String>> {
    let custom = load_custom_todos(area)?.filter(|todos| !todos.is_empty());

    match action {
        TodosAction::List => {}
        TodosAction::Add(text) => {
            let text = text.trim();
            if text.is_empty() {
                anyhow::bail!("Checklist item text is empty");
            }
            // Adding to the defaults turns them into an editable custom list.
            let mut todos = custom.unwrap_or_else(|| checklist_items(area));
            todos.push(text.to_string());
            save_custom_todos(area, &todos)?;
        }
        TodosAction::Remove(number) => {
            let mut todos = custom.unwrap_or_else(|| checklist_items(area));
            if *number == 0 || *number > todos.len() {
                anyhow::bail!(
                    "No checklist item {} (the list has {})",
                    number,
                    todos.len()
                );
            }
            todos.remove(number - 1);
            save_custom_todos(area, &todos)?;
        }
        TodosAction::Clear => area.remove(crate::constants::CUSTOM_TODOS_KEY)?,
    }

    Ok(checklist_items(area))
}

pub fn handle_todos_command(action: &TodosAction) -> Result<()> {
    log_version!();
    let partitions = Partitions::open()?;
    let items = apply(partitions.sync.as_ref(), action)?;

    match action {
        TodosAction::Add(_) => log_block_start!("Added checklist item"),
        TodosAction::Remove(n) => log_block_start!("Removed checklist item {}", n),
        TodosAction::Clear => log_block_start!("Restored the built-in checklist"),
        TodosAction::List => log_block_start!("Checklist"),
    }
    for (i, item) in items.iter().enumerate() {
        log_indented!("{}. {}", i + 1, item);
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("todos - Manage the pre-leave checklist");
    log_block_start!("Usage: detoxr todos [list | add <text> | remove <n> | clear]");
    log_block_start!("Description:");
    log_indented!("The checklist appears when a video ends (checklist_gate_enabled).");
    log_indented!("'clear' goes back to the eight built-in items.");
    log_block_start!("Examples:");
    log_indented!("detoxr todos add Water the plants");
    log_indented!("detoxr todos remove 3");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_CHECKLIST_ITEMS;
    use crate::storage::MemoryArea;

    #[test]
    fn test_list_falls_back_to_defaults() {
        let area = MemoryArea::new("sync");
        let items = apply(&area, &TodosAction::List).unwrap();
        assert_eq!(items.len(), DEFAULT_CHECKLIST_ITEMS.len());
        assert!(area.is_empty());
    }

    #[test]
    fn test_add_extends_defaults() {
        let area = MemoryArea::new("sync");
        let items = apply(&area, &TodosAction::Add("  Stretch ".into())).unwrap();
        assert_eq!(items.len(), DEFAULT_CHECKLIST_ITEMS.len() + 1);
        assert_eq!(items.last().map(String::as_str), Some("Stretch"));
        assert_eq!(load_custom_todos(&area).unwrap(), Some(items));
    }

    #[test]
    fn test_remove_and_clear() {
        let area = MemoryArea::new("sync");
        save_custom_todos(&area, &["A".into(), "B".into()]).unwrap();

        assert_eq!(apply(&area, &TodosAction::Remove(1)).unwrap(), vec!["B"]);
        assert!(apply(&area, &TodosAction::Remove(5)).is_err());

        let items = apply(&area, &TodosAction::Clear).unwrap();
        assert_eq!(items.len(), DEFAULT_CHECKLIST_ITEMS.len());
    }

    #[test]
    fn test_removing_last_item_restores_defaults() {
        let area = MemoryArea::new("sync");
        save_custom_todos(&area, &["Only".into()]).unwrap();
        let items = apply(&area, &TodosAction::Remove(1)).unwrap();
        assert_eq!(items.len(), DEFAULT_CHECKLIST_ITEMS.len());
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let area = MemoryArea::new("sync");
        assert!(apply(&area, &TodosAction::Add("   ".into())).is_err());
    }
}
