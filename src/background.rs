//! Shared background coordinator.
//!
//! One instance serves every tab. It owns the options record, the session
//! store and two timers: the active-tab poll (credits time to whatever
//! tracked tab has focus) and the hourly expiry sweep.

use std::sync::Arc;

use crate::config::Options;
use crate::constants::{ACTIVE_TAB_POLL_INTERVAL_MS, EXPIRY_SWEEP_INTERVAL_MS};
use crate::messaging::{BrowserTabs, Delivery, Message, Reply, TabInfo, broadcast_to_tracked};
use crate::scheduler::TaskSet;
use crate::session::{SessionRecord, SessionStore};
use crate::storage::{StorageArea, load_options, save_options};
use crate::time_source::EpochMillis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BackgroundTask {
    ActiveTabPoll,
    ExpirySweep,
}

pub struct Background {
    local: Arc<dyn StorageArea>,
    options: Options,
    sessions: SessionStore,
    tasks: TaskSet<BackgroundTask>,
}

impl Background {
    pub fn new(local: Arc<dyn StorageArea>) -> Self {
        Self {
            sessions: SessionStore::new(local.clone()),
            local,
            options: Options::default(),
            tasks: TaskSet::new(),
        }
    }

    /// Load persisted state and start both timers.
    pub fn start(&mut self, now: EpochMillis) {
        self.options = load_options(self.local.as_ref());
        self.sessions.load();
        self.tasks
            .schedule_every(BackgroundTask::ActiveTabPoll, ACTIVE_TAB_POLL_INTERVAL_MS, now);
        self.tasks
            .schedule_every(BackgroundTask::ExpirySweep, EXPIRY_SWEEP_INTERVAL_MS, now);
        log_debug!(
            "Background started with {} stored session(s)",
            self.sessions.len()
        );
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn next_due(&self) -> Option<EpochMillis> {
        self.tasks.next_due()
    }

    pub fn is_scheduled(&self, task: BackgroundTask) -> bool {
        self.tasks.is_scheduled(task)
    }

    /// Handle a request from a foreground (or the settings surface, which
    /// has no tab). Returns the reply for request-style messages.
    pub fn handle_message(
        &mut self,
        message: Message,
        sender: Option<&TabInfo>,
        tabs: &mut dyn BrowserTabs,
        now: EpochMillis,
    ) -> Option<Reply> {
        match message {
            Message::GetSessionData => {
                let Some(tab) = sender else {
                    return Some(Reply::error("No tab information"));
                };
                let session_data = tab
                    .domain()
                    .and_then(|domain| self.sessions.get(&domain).copied());
                Some(Reply::SessionData { session_data })
            }
            Message::GetOptions => Some(Reply::Options {
                options: self.options.clone(),
            }),
            Message::ResetSessions => {
                self.reset_sessions(tabs);
                None
            }
            Message::OptionsUpdated { options } => {
                self.update_options(options, tabs);
                None
            }
            Message::UpdateVideosWatched { videos_watched } => {
                if let Some(domain) = sender.and_then(TabInfo::domain) {
                    self.sessions.record_video_watched(&domain, videos_watched);
                }
                None
            }
            Message::UpdateSessionTime => {
                if let Some(domain) = sender.and_then(TabInfo::domain) {
                    self.sessions.accrue(&domain, now);
                }
                None
            }
            other => {
                log_debug!("Background ignoring {}", other.action());
                None
            }
        }
    }

    fn reset_sessions(&mut self, tabs: &mut dyn BrowserTabs) {
        self.sessions.reset_all();
        log_info!("Session statistics cleared");
        broadcast_to_tracked(tabs, &Message::SessionReset);
    }

    /// Replace the options wholesale, persist, and push to every tracked tab.
    fn update_options(&mut self, options: Options, tabs: &mut dyn BrowserTabs) {
        self.options = options;
        if let Err(e) = save_options(self.local.as_ref(), &self.options) {
            log_warning!("Could not persist options: {e:#}");
        }
        broadcast_to_tracked(
            tabs,
            &Message::UpdateOptions {
                options: self.options.clone(),
            },
        );
    }

    /// A tab finished loading: make sure its site has a record and
    /// initialize the page.
    pub fn on_tab_loaded(&mut self, tab: &TabInfo, tabs: &mut dyn BrowserTabs, now: EpochMillis) {
        if !tab.is_tracked() {
            return;
        }
        let Some(domain) = tab.domain() else { return };
        let session_data = self.sessions.get_or_create(&domain, now);
        let message = Message::Initialize {
            session_data,
            options: self.options.clone(),
        };
        if tabs.send(tab.id, message) == Delivery::DestinationAbsent {
            log_debug!("{} closed before it could be initialized", tab.id);
        }
    }

    /// Restart the credit window so time spent in other tabs is not counted.
    pub fn on_tab_activated(&mut self, tab: &TabInfo, now: EpochMillis) {
        if !tab.is_tracked() {
            return;
        }
        if let Some(domain) = tab.domain() {
            self.sessions.touch(&domain, now);
        }
    }

    /// `active_tab` is the focused window's active tab; `None` when focus
    /// left the browser.
    pub fn on_window_focus_changed(&mut self, active_tab: Option<&TabInfo>, now: EpochMillis) {
        if let Some(tab) = active_tab {
            self.on_tab_activated(tab, now);
        }
    }

    /// Run every timer due at `now`.
    pub fn tick(&mut self, tabs: &mut dyn BrowserTabs, now: EpochMillis) {
        for task in self.tasks.take_due(now) {
            match task {
                BackgroundTask::ActiveTabPoll => self.poll_active_tab(tabs, now),
                BackgroundTask::ExpirySweep => {
                    let removed = self.sessions.sweep_expired(now);
                    if !removed.is_empty() {
                        log_info!("Expired {} idle session(s)", removed.len());
                    }
                }
            }
        }
    }

    fn poll_active_tab(&mut self, tabs: &mut dyn BrowserTabs, now: EpochMillis) {
        let Some(tab) = tabs.active_tab() else { return };
        if !tab.is_tracked() {
            return;
        }
        let Some(domain) = tab.domain() else { return };
        let Some(session_data) = self.sessions.accrue(&domain, now) else {
            return;
        };
        tabs.send(tab.id, Message::UpdateSessionData { session_data });
    }

    pub fn session_for(&self, domain: &str) -> Option<SessionRecord> {
        self.sessions.get(domain).copied()
    }
}
