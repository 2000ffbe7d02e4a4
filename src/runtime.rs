//! In-process host wiring one background to many foregrounds.
//!
//! [`Browser`] models tabs, focus and per-tab mailboxes; [`Runtime`] owns the
//! background and one [`Foreground`] per tracked tab, and delivers messages
//! until nothing is left in flight. Time only moves through
//! [`Runtime::advance_to`], which fires every due timer in deadline order.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use crate::background::Background;
use crate::effects::{ClickDecision, ElementId, HeadlessSurface};
use crate::foreground::{Foreground, PlaybackEvent};
use crate::messaging::{BrowserTabs, Delivery, Message, TabId, TabInfo, broadcast_to_tracked};
use crate::storage::{StorageArea, save_custom_todos};
use crate::time_source::EpochMillis;

/// Upper bound on delivery rounds per pump; the protocol settles in a few.
const MAX_PUMP_ROUNDS: usize = 64;

#[derive(Debug)]
struct TabState {
    url: String,
    mailbox: VecDeque<Message>,
}

#[derive(Debug)]
pub struct Browser {
    tabs: BTreeMap<TabId, TabState>,
    active: Option<TabId>,
    window_focused: bool,
    next_id: u32,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser {
    pub fn new() -> Self {
        Self {
            tabs: BTreeMap::new(),
            active: None,
            window_focused: true,
            next_id: 1,
        }
    }

    pub fn open(&mut self, url: &str) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        self.tabs.insert(
            id,
            TabState {
                url: url.to_string(),
                mailbox: VecDeque::new(),
            },
        );
        self.active = Some(id);
        id
    }

    pub fn close(&mut self, tab: TabId) {
        self.tabs.remove(&tab);
        if self.active == Some(tab) {
            self.active = self.tabs.keys().next_back().copied();
        }
    }

    pub fn set_url(&mut self, tab: TabId, url: &str) {
        if let Some(state) = self.tabs.get_mut(&tab) {
            state.url = url.to_string();
        }
    }

    pub fn activate(&mut self, tab: TabId) -> bool {
        if self.tabs.contains_key(&tab) {
            self.active = Some(tab);
            true
        } else {
            false
        }
    }

    pub fn set_window_focused(&mut self, focused: bool) {
        self.window_focused = focused;
    }

    pub fn info(&self, tab: TabId) -> Option<TabInfo> {
        self.tabs.get(&tab).map(|state| TabInfo {
            id: tab,
            url: state.url.clone(),
            active: self.active == Some(tab),
            window_focused: self.window_focused,
        })
    }

    fn take_mail(&mut self, tab: TabId) -> Vec<Message> {
        self.tabs
            .get_mut(&tab)
            .map(|state| state.mailbox.drain(..).collect())
            .unwrap_or_default()
    }
}

impl BrowserTabs for Browser {
    fn tabs(&self) -> Vec<TabInfo> {
        self.tabs.keys().filter_map(|id| self.info(*id)).collect()
    }

    fn active_tab(&self) -> Option<TabInfo> {
        if !self.window_focused {
            return None;
        }
        self.active.and_then(|id| self.info(id))
    }

    fn send(&mut self, tab: TabId, message: Message) -> Delivery {
        match self.tabs.get_mut(&tab) {
            Some(state) => {
                state.mailbox.push_back(message);
                Delivery::Delivered
            }
            None => Delivery::DestinationAbsent,
        }
    }
}

pub struct Runtime {
    now: EpochMillis,
    browser: Browser,
    background: Background,
    foregrounds: BTreeMap<TabId, Foreground<HeadlessSurface>>,
    sync: Arc<dyn StorageArea>,
}

impl Runtime {
    /// Start the background over the given partitions at `now`.
    pub fn new(local: Arc<dyn StorageArea>, sync: Arc<dyn StorageArea>, now: EpochMillis) -> Self {
        let mut background = Background::new(local);
        background.start(now);
        Self {
            now,
            browser: Browser::new(),
            background,
            foregrounds: BTreeMap::new(),
            sync,
        }
    }

    pub fn now(&self) -> EpochMillis {
        self.now
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn foreground(&self, tab: TabId) -> Option<&Foreground<HeadlessSurface>> {
        self.foregrounds.get(&tab)
    }

    pub fn foreground_mut(&mut self, tab: TabId) -> Option<&mut Foreground<HeadlessSurface>> {
        self.foregrounds.get_mut(&tab)
    }

    /// Open a tab and make it active.
    pub fn open_tab(&mut self, url: &str) -> TabId {
        let tab = self.browser.open(url);
        self.load_page(tab);
        if let Some(info) = self.browser.info(tab) {
            self.background.on_tab_activated(&info, self.now);
        }
        self.pump();
        tab
    }

    /// Full page load: inject a foreground on tracked sites.
    fn load_page(&mut self, tab: TabId) {
        self.foregrounds.remove(&tab);
        let Some(info) = self.browser.info(tab) else {
            return;
        };
        if !info.is_tracked() {
            return;
        }
        let fg = Foreground::new(
            &info.url,
            HeadlessSurface::new(),
            self.sync.clone(),
            self.now,
        );
        self.foregrounds.insert(tab, fg);
        self.background
            .on_tab_loaded(&info, &mut self.browser, self.now);
    }

    /// Navigate within the page when staying on a tracked site, otherwise
    /// treat it as a full page load.
    pub fn navigate(&mut self, tab: TabId, url: &str) {
        self.browser.set_url(tab, url);
        let in_app = crate::sites::is_tracked_site(url) && self.foregrounds.contains_key(&tab);
        if in_app {
            if let Some(fg) = self.foregrounds.get_mut(&tab) {
                fg.on_navigation(url, self.now);
            }
        } else {
            self.load_page(tab);
        }
        self.pump();
    }

    pub fn activate(&mut self, tab: TabId) {
        if self.browser.activate(tab)
            && let Some(info) = self.browser.info(tab)
        {
            self.background.on_tab_activated(&info, self.now);
        }
        self.pump();
    }

    pub fn set_window_focus(&mut self, focused: bool) {
        self.browser.set_window_focused(focused);
        let active = self.browser.active_tab();
        self.background
            .on_window_focus_changed(active.as_ref(), self.now);
        self.pump();
    }

    pub fn close_tab(&mut self, tab: TabId) {
        self.foregrounds.remove(&tab);
        self.browser.close(tab);
    }

    pub fn click(&mut self, tab: TabId, element: ElementId) -> Option<ClickDecision> {
        let now = self.now;
        let decision = self.foregrounds.get_mut(&tab)?.on_click(element, now);
        self.pump();
        Some(decision)
    }

    pub fn playback_event(&mut self, tab: TabId, event: PlaybackEvent) {
        if let Some(fg) = self.foregrounds.get_mut(&tab) {
            fg.on_playback_event(event, self.now);
        }
        self.pump();
    }

    /// Message from the settings surface to the background.
    pub fn send_from_settings(&mut self, message: Message) {
        self.background
            .handle_message(message, None, &mut self.browser, self.now);
        self.pump();
    }

    /// Save the custom checklist and push it to open pages.
    pub fn update_todos(&mut self, todos: Vec<String>) {
        if let Err(e) = save_custom_todos(self.sync.as_ref(), &todos) {
            log_warning!("Could not save checklist: {e:#}");
        }
        broadcast_to_tracked(&mut self.browser, &Message::UpdateTodos { todos });
        self.pump();
    }

    /// Deliver queued messages until every outbox and mailbox is empty.
    pub fn pump(&mut self) {
        let now = self.now;
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut progressed = false;

            let tab_ids: Vec<TabId> = self.foregrounds.keys().copied().collect();
            for tab in tab_ids {
                let Some(fg) = self.foregrounds.get_mut(&tab) else {
                    continue;
                };
                let sender = self.browser.info(tab);
                for message in fg.drain_outbox() {
                    progressed = true;
                    let expects_reply = message.expects_reply();
                    let reply = self.background.handle_message(
                        message,
                        sender.as_ref(),
                        &mut self.browser,
                        now,
                    );
                    if expects_reply && let Some(reply) = reply {
                        fg.accept_reply(reply, now);
                    }
                }

                for message in self.browser.take_mail(tab) {
                    progressed = true;
                    fg.handle_message(message, now);
                }
            }

            if !progressed {
                return;
            }
        }
        log_warning!("Message delivery did not settle after {MAX_PUMP_ROUNDS} rounds");
    }

    fn next_due(&self) -> Option<EpochMillis> {
        self.foregrounds
            .values()
            .filter_map(Foreground::next_due)
            .chain(self.background.next_due())
            .min()
    }

    /// Move time forward to `target`, firing timers in deadline order.
    pub fn advance_to(&mut self, target: EpochMillis) {
        while let Some(due) = self.next_due() {
            if due > target {
                break;
            }
            self.now = due.max(self.now);
            let now = self.now;
            self.background.tick(&mut self.browser, now);
            for fg in self.foregrounds.values_mut() {
                fg.tick(now);
            }
            self.pump();
        }
        self.now = target.max(self.now);
    }

    pub fn advance(&mut self, ms: u64) {
        self.advance_to(self.now.saturating_add(ms as i64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::storage::MemoryArea;

    fn runtime() -> Runtime {
        Runtime::new(
            Arc::new(MemoryArea::new("local")),
            Arc::new(MemoryArea::new("sync")),
            TEST_EPOCH,
        )
    }

    #[test]
    fn test_open_tracked_tab_starts_effects() {
        let mut rt = runtime();
        let tab = rt.open_tab(TEST_WATCH_URL);

        let fg = rt.foreground(tab).unwrap();
        assert_eq!(fg.current_level(), Some(1));
        assert!(fg.surface().status.is_some());
        assert!(rt.background().session_for(TEST_DOMAIN).is_some());
    }

    #[test]
    fn test_untracked_tab_has_no_foreground() {
        let mut rt = runtime();
        let tab = rt.open_tab(TEST_UNTRACKED_URL);
        assert!(rt.foreground(tab).is_none());
        assert!(rt.background().sessions().is_empty());
    }

    #[test]
    fn test_closed_tab_is_absent_destination() {
        let mut rt = runtime();
        let tab = rt.open_tab(TEST_WATCH_URL);
        rt.close_tab(tab);
        assert_eq!(
            rt.browser.send(tab, Message::SessionReset),
            Delivery::DestinationAbsent
        );
        rt.send_from_settings(Message::ResetSessions);
    }

    #[test]
    fn test_advance_fires_timers_in_order() {
        let mut rt = runtime();
        let tab = rt.open_tab(TEST_WATCH_URL);
        rt.advance(6 * MINUTE_MS as u64);

        assert_eq!(rt.now(), TEST_EPOCH + 6 * MINUTE_MS);
        let record = rt.background().session_for(TEST_DOMAIN).unwrap();
        assert_eq!(record.total_active_time_ms, 6 * MINUTE_MS as u64);
        assert!(rt.foreground(tab).unwrap().current_level().unwrap() >= 2);
    }

    #[test]
    fn test_closed_tab_stops_accruing() {
        let mut rt = runtime();
        let tab = rt.open_tab(TEST_WATCH_URL);
        rt.advance(MINUTE_MS as u64);
        rt.close_tab(tab);
        rt.advance(10 * MINUTE_MS as u64);

        let record = rt.background().session_for(TEST_DOMAIN).unwrap();
        assert_eq!(record.total_active_time_ms, MINUTE_MS as u64);
    }

    #[test]
    fn test_refocus_does_not_credit_time_away() {
        let mut rt = runtime();
        let first = rt.open_tab(TEST_WATCH_URL);
        rt.close_tab(first);
        rt.advance(10 * MINUTE_MS as u64);

        let tab = rt.open_tab(TEST_HOME_URL);
        let record = rt.background().session_for(TEST_DOMAIN).unwrap();
        assert_eq!(record.total_active_time_ms, 0);
        assert!(rt.foreground(tab).is_some());
    }
}
