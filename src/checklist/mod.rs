//! End-of-video checklist gate.
//!
//! `Hidden -> Shown(remaining) -> Unlocked -> Hidden`. The gate opens when the
//! player's end screen appears, counts down once per second, and only then
//! lets the viewer dismiss it. Ticking items is informational and never
//! affects the unlock.

use serde::{Deserialize, Serialize};

use crate::constants::CHECKLIST_WAIT_SECONDS;

pub const TITLE: &str = "Before the next video...";
pub const SUBTITLE: &str = "Take a moment to do something productive:";
pub const WAITING_HINT: &str = "Take a moment to consider these activities";
pub const READY_HINT: &str = "Click continue when ready";
pub const READY_LABEL: &str = "Continue Watching";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Hidden,
    Shown { remaining_secs: u32 },
    Unlocked,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTick {
    /// Nothing is counting down.
    Idle,
    Counting { remaining_secs: u32 },
    /// The countdown just reached zero.
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    Dismissed,
    StillLocked { remaining_secs: u32 },
    NotShown,
}

/// Everything the overlay displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistView {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<ChecklistItem>,
    pub button_label: String,
    pub button_enabled: bool,
    pub hint: String,
}

#[derive(Debug, Clone)]
pub struct ChecklistGate {
    state: GateState,
    items: Vec<ChecklistItem>,
}

impl Default for ChecklistGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklistGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Hidden,
            items: Vec::new(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state != GateState::Hidden
    }

    /// Show the overlay with fresh, unticked items.
    ///
    /// Returns `false` when an overlay is already showing.
    pub fn open(&mut self, texts: &[String]) -> bool {
        if self.is_visible() {
            return false;
        }
        self.items = texts.iter().map(ChecklistItem::new).collect();
        self.state = GateState::Shown {
            remaining_secs: CHECKLIST_WAIT_SECONDS,
        };
        true
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> GateTick {
        let GateState::Shown { remaining_secs } = self.state else {
            return GateTick::Idle;
        };
        let remaining_secs = remaining_secs.saturating_sub(1);
        if remaining_secs == 0 {
            self.state = GateState::Unlocked;
            GateTick::Unlocked
        } else {
            self.state = GateState::Shown { remaining_secs };
            GateTick::Counting { remaining_secs }
        }
    }

    /// Flip an item's completion mark. Returns the new value.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        if !self.is_visible() {
            return None;
        }
        let item = self.items.get_mut(index)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn dismiss(&mut self) -> DismissOutcome {
        match self.state {
            GateState::Hidden => DismissOutcome::NotShown,
            GateState::Shown { remaining_secs } => DismissOutcome::StillLocked { remaining_secs },
            GateState::Unlocked => {
                self.clear();
                DismissOutcome::Dismissed
            }
        }
    }

    /// Swap the item texts in place; completion marks reset.
    pub fn replace_items(&mut self, texts: &[String]) {
        if self.is_visible() {
            self.items = texts.iter().map(ChecklistItem::new).collect();
        }
    }

    /// Remove the overlay regardless of the countdown.
    pub fn clear(&mut self) {
        self.state = GateState::Hidden;
        self.items.clear();
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn view(&self) -> Option<ChecklistView> {
        let (button_label, button_enabled, hint) = match self.state {
            GateState::Hidden => return None,
            GateState::Shown { remaining_secs } => (
                format!("Please wait... ({remaining_secs}s)"),
                false,
                WAITING_HINT,
            ),
            GateState::Unlocked => (READY_LABEL.to_string(), true, READY_HINT),
        };
        Some(ChecklistView {
            title: TITLE.to_string(),
            subtitle: SUBTITLE.to_string(),
            items: self.items.clone(),
            button_label,
            button_enabled,
            hint: hint.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> Vec<String> {
        vec!["Stretch".to_string(), "Drink water".to_string()]
    }

    #[test]
    fn test_open_starts_locked() {
        let mut gate = ChecklistGate::new();
        assert!(gate.open(&texts()));

        let view = gate.view().unwrap();
        assert!(!view.button_enabled);
        assert_eq!(view.button_label, "Please wait... (15s)");
        assert_eq!(view.hint, WAITING_HINT);
        assert_eq!(view.items.len(), 2);
        assert!(!gate.open(&texts()));
    }

    #[test]
    fn test_unlocks_after_fifteen_ticks_without_items() {
        let mut gate = ChecklistGate::new();
        gate.open(&texts());

        for expected in (1..15).rev() {
            assert_eq!(
                gate.tick(),
                GateTick::Counting {
                    remaining_secs: expected
                }
            );
            assert_eq!(
                gate.dismiss(),
                DismissOutcome::StillLocked {
                    remaining_secs: expected
                }
            );
        }
        assert_eq!(gate.tick(), GateTick::Unlocked);

        let view = gate.view().unwrap();
        assert!(view.button_enabled);
        assert_eq!(view.button_label, READY_LABEL);
        assert_eq!(view.hint, READY_HINT);
        assert!(view.items.iter().all(|i| !i.completed));

        assert_eq!(gate.tick(), GateTick::Idle);
        assert_eq!(gate.dismiss(), DismissOutcome::Dismissed);
        assert_eq!(gate.state(), GateState::Hidden);
        assert_eq!(gate.dismiss(), DismissOutcome::NotShown);
    }

    #[test]
    fn test_toggle_is_informational() {
        let mut gate = ChecklistGate::new();
        assert_eq!(gate.toggle(0), None);
        gate.open(&texts());
        assert_eq!(gate.toggle(1), Some(true));
        assert_eq!(gate.toggle(1), Some(false));
        assert_eq!(gate.toggle(5), None);
        assert!(matches!(gate.state(), GateState::Shown { .. }));
    }

    #[test]
    fn test_replace_items_live_patches() {
        let mut gate = ChecklistGate::new();
        gate.replace_items(&texts());
        assert!(gate.items().is_empty());

        gate.open(&texts());
        gate.toggle(0);
        gate.tick();
        gate.replace_items(&["Walk".to_string()]);

        assert_eq!(gate.items(), &[ChecklistItem::new("Walk")]);
        assert_eq!(gate.state(), GateState::Shown { remaining_secs: 14 });
    }

    #[test]
    fn test_fresh_open_resets_completion() {
        let mut gate = ChecklistGate::new();
        gate.open(&texts());
        gate.toggle(0);
        gate.clear();
        assert!(gate.view().is_none());

        gate.open(&texts());
        assert!(gate.items().iter().all(|i| !i.completed));
    }
}
