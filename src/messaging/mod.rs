//! Cross-context message contract.
//!
//! Messages are action-tagged and serialize to the same JSON shape the
//! browser runtime carries:
//!
//! ```json
//! {"action": "updateVideosWatched", "videosWatched": 3}
//! ```
//!
//! Delivery is fire-and-forget. A destination that no longer exists is an
//! expected outcome ([`Delivery::DestinationAbsent`]), not an error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Options;
use crate::session::SessionRecord;
use crate::sites;

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.0)
    }
}

/// What the background knows about a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    /// Selected tab of its window.
    pub active: bool,
    pub window_focused: bool,
}

impl TabInfo {
    pub fn domain(&self) -> Option<String> {
        sites::domain_from_url(&self.url)
    }

    pub fn is_tracked(&self) -> bool {
        sites::is_tracked_site(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    // foreground -> background
    GetSessionData,
    ResetSessions,
    OptionsUpdated { options: Options },
    GetOptions,
    UpdateVideosWatched { videos_watched: u64 },
    UpdateSessionTime,

    // background -> foreground
    Initialize {
        session_data: SessionRecord,
        options: Options,
    },
    UpdateSessionData { session_data: SessionRecord },
    UpdateOptions { options: Options },
    SessionReset,

    // settings -> foreground
    UpdateTodos { todos: Vec<String> },
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::GetSessionData => "getSessionData",
            Message::ResetSessions => "resetSessions",
            Message::OptionsUpdated { .. } => "optionsUpdated",
            Message::GetOptions => "getOptions",
            Message::UpdateVideosWatched { .. } => "updateVideosWatched",
            Message::UpdateSessionTime => "updateSessionTime",
            Message::Initialize { .. } => "initialize",
            Message::UpdateSessionData { .. } => "updateSessionData",
            Message::UpdateOptions { .. } => "updateOptions",
            Message::SessionReset => "sessionReset",
            Message::UpdateTodos { .. } => "updateTodos",
        }
    }

    /// Whether the sender expects a [`Reply`].
    pub fn expects_reply(&self) -> bool {
        matches!(self, Message::GetSessionData | Message::GetOptions)
    }
}

/// Response to a request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Reply {
    // SessionData last: its only field is optional and would match anything.
    Error { error: String },
    Options { options: Options },
    SessionData { session_data: Option<SessionRecord> },
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The tab closed or never had a listener.
    DestinationAbsent,
}

/// The background's view of the browser's tabs.
pub trait BrowserTabs {
    fn tabs(&self) -> Vec<TabInfo>;

    /// Active tab of the focused window, if any.
    fn active_tab(&self) -> Option<TabInfo>;

    fn send(&mut self, tab: TabId, message: Message) -> Delivery;
}

/// Delivery counts for a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub absent: usize,
}

/// Send `message` to every tab on a tracked site; absent tabs are skipped.
pub fn broadcast_to_tracked(tabs: &mut dyn BrowserTabs, message: &Message) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for tab in tabs.tabs().into_iter().filter(TabInfo::is_tracked) {
        match tabs.send(tab.id, message.clone()) {
            Delivery::Delivered => report.delivered += 1,
            Delivery::DestinationAbsent => report.absent += 1,
        }
    }
    if report.absent > 0 {
        log_debug!(
            "{} not delivered to {} closed tab(s)",
            message.action(),
            report.absent
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use serde_json::json;

    struct FakeTabs {
        tabs: Vec<TabInfo>,
        open: Vec<TabId>,
        sent: Vec<(TabId, Message)>,
    }

    impl BrowserTabs for FakeTabs {
        fn tabs(&self) -> Vec<TabInfo> {
            self.tabs.clone()
        }

        fn active_tab(&self) -> Option<TabInfo> {
            self.tabs.iter().find(|t| t.active).cloned()
        }

        fn send(&mut self, tab: TabId, message: Message) -> Delivery {
            if !self.open.contains(&tab) {
                return Delivery::DestinationAbsent;
            }
            self.sent.push((tab, message));
            Delivery::Delivered
        }
    }

    fn tab(id: u32, url: &str) -> TabInfo {
        TabInfo {
            id: TabId(id),
            url: url.to_string(),
            active: false,
            window_focused: true,
        }
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(Message::UpdateVideosWatched { videos_watched: 3 }).unwrap();
        assert_eq!(json, json!({"action": "updateVideosWatched", "videosWatched": 3}));

        let json = serde_json::to_value(Message::SessionReset).unwrap();
        assert_eq!(json, json!({"action": "sessionReset"}));
    }

    #[test]
    fn test_message_parses_from_wire() {
        let message: Message = serde_json::from_value(json!({
            "action": "updateTodos",
            "todos": ["Stretch", "Water"]
        }))
        .unwrap();
        assert_eq!(
            message,
            Message::UpdateTodos {
                todos: vec!["Stretch".to_string(), "Water".to_string()]
            }
        );
    }

    #[test]
    fn test_options_payload_is_lenient() {
        let message: Message = serde_json::from_value(json!({
            "action": "optionsUpdated",
            "options": {"levelInterval": 3, "maxLevels": 7}
        }))
        .unwrap();
        let Message::OptionsUpdated { options } = message else {
            panic!("wrong variant");
        };
        assert_eq!(options.level_interval_minutes, 3.0);
        assert_eq!(options.max_levels, 7);
        assert!(options.blur_enabled);
    }

    #[test]
    fn test_action_names_match_serialization() {
        let messages = [
            Message::GetSessionData,
            Message::GetOptions,
            Message::UpdateSessionTime,
            Message::UpdateOptions {
                options: Options::default(),
            },
        ];
        for message in messages {
            let json = serde_json::to_value(&message).unwrap();
            assert_eq!(json["action"], json!(message.action()));
        }
    }

    #[test]
    fn test_reply_wire_shape() {
        assert_eq!(
            serde_json::to_value(Reply::error("No tab information")).unwrap(),
            json!({"error": "No tab information"})
        );
        assert_eq!(
            serde_json::to_value(Reply::SessionData { session_data: None }).unwrap(),
            json!({"sessionData": null})
        );

        let reply: Reply = serde_json::from_value(json!({"error": "gone"})).unwrap();
        assert_eq!(reply, Reply::error("gone"));
    }

    #[test]
    fn test_broadcast_skips_untracked_and_counts_absent() {
        let mut tabs = FakeTabs {
            tabs: vec![
                tab(1, TEST_WATCH_URL),
                tab(2, TEST_UNTRACKED_URL),
                tab(3, TEST_HOME_URL),
            ],
            open: vec![TabId(1), TabId(2)],
            sent: Vec::new(),
        };

        let report = broadcast_to_tracked(&mut tabs, &Message::SessionReset);
        assert_eq!(report, BroadcastReport { delivered: 1, absent: 1 });
        assert_eq!(tabs.sent, vec![(TabId(1), Message::SessionReset)]);
    }
}
