//! Per-page foreground context.
//!
//! A [`Foreground`] lives in one tab on a tracked site. It mirrors the
//! site's session totals, re-renders the escalation plan on a cadence derived
//! from the options, runs the checklist gate and the video counter, and
//! queues messages for the background in an outbox that the host drains.
//!
//! Startup mirrors the page script's handshake: `getOptions`, then
//! `getSessionData`, then the effect system starts. The background's
//! `initialize` message (sent when the tab finishes loading) starts it too;
//! starting twice is harmless because every timer is keyed by purpose.

use std::sync::Arc;

use crate::checklist::{ChecklistGate, DismissOutcome, GateTick};
use crate::config::Options;
use crate::constants::{
    CHECKLIST_COUNTDOWN_TICK_MS, CHECKLIST_SETTLE_DELAY_MS, SESSION_REPORT_INTERVAL_MS,
};
use crate::effects::{ClickDecision, DelayRegistry, ElementId, Surface, clear_surface, render_plan};
use crate::escalation::{EffectPlan, plan, refresh_interval_ms};
use crate::messaging::{Message, Reply};
use crate::scheduler::TaskSet;
use crate::session::SessionView;
use crate::sites;
use crate::storage::{StorageArea, checklist_items};
use crate::time_source::EpochMillis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ForegroundTask {
    EffectRefresh,
    SessionReport,
    ChecklistCountdown,
    ChecklistSettle,
}

/// Signals from the video player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Something inside the player container changed.
    PlayerMutated,
    /// The video fired its `ended` event.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handshake {
    AwaitingOptions,
    AwaitingSession,
    Done,
}

pub struct Foreground<S: Surface> {
    url: String,
    options: Options,
    view: SessionView,
    surface: S,
    gate: ChecklistGate,
    todo_items: Vec<String>,
    todos_loaded: bool,
    sync: Arc<dyn StorageArea>,
    delays: DelayRegistry,
    current_video_id: Option<String>,
    end_screen_watch: bool,
    outbox: Vec<Message>,
    tasks: TaskSet<ForegroundTask>,
    current_plan: Option<EffectPlan>,
    handshake: Handshake,
}

impl<S: Surface> Foreground<S> {
    /// Page script loaded at `url`. Queues the options request and starts
    /// the periodic session report.
    pub fn new(url: &str, surface: S, sync: Arc<dyn StorageArea>, now: EpochMillis) -> Self {
        let mut tasks = TaskSet::new();
        tasks.schedule_every(ForegroundTask::SessionReport, SESSION_REPORT_INTERVAL_MS, now);
        Self {
            url: url.to_string(),
            options: Options::default(),
            view: SessionView::new(now),
            surface,
            gate: ChecklistGate::new(),
            todo_items: Vec::new(),
            todos_loaded: false,
            sync,
            delays: DelayRegistry::new(),
            current_video_id: None,
            end_screen_watch: false,
            outbox: vec![Message::GetOptions],
            tasks,
            current_plan: None,
            handshake: Handshake::AwaitingOptions,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn gate(&self) -> &ChecklistGate {
        &self.gate
    }

    pub fn delays(&self) -> &DelayRegistry {
        &self.delays
    }

    pub fn current_plan(&self) -> Option<&EffectPlan> {
        self.current_plan.as_ref()
    }

    pub fn current_level(&self) -> Option<u32> {
        self.current_plan.as_ref().map(|p| p.level)
    }

    pub fn is_scheduled(&self, task: ForegroundTask) -> bool {
        self.tasks.is_scheduled(task)
    }

    /// Earliest timer or deferred click.
    pub fn next_due(&self) -> Option<EpochMillis> {
        match (self.tasks.next_due(), self.delays.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Messages queued for the background since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    // # Messages

    pub fn handle_message(&mut self, message: Message, now: EpochMillis) {
        match message {
            Message::Initialize {
                session_data,
                options,
            } => {
                self.view.sync(&session_data);
                self.options = options;
                self.handshake = Handshake::Done;
                self.start_effect_system(now);
            }
            Message::UpdateSessionData { session_data } => self.view.sync(&session_data),
            Message::UpdateOptions { options } => {
                self.options = options;
                self.restart_effect_system(now);
            }
            Message::SessionReset => {
                self.view.clear(now);
                self.restart_effect_system(now);
            }
            Message::UpdateTodos { todos } => {
                self.todo_items = if todos.is_empty() {
                    crate::storage::default_checklist_items()
                } else {
                    todos
                };
                self.todos_loaded = true;
                if self.gate.is_visible() {
                    self.gate.replace_items(&self.todo_items);
                    self.render_checklist();
                }
            }
            other => log_debug!("Foreground ignoring {}", other.action()),
        }
    }

    /// Reply to one of the handshake requests.
    pub fn accept_reply(&mut self, reply: Reply, now: EpochMillis) {
        match (self.handshake, reply) {
            (Handshake::AwaitingOptions, reply) => {
                if let Reply::Options { options } = reply {
                    self.options = options;
                }
                self.handshake = Handshake::AwaitingSession;
                self.outbox.push(Message::GetSessionData);
            }
            (Handshake::AwaitingSession, reply) => {
                match reply {
                    Reply::SessionData {
                        session_data: Some(record),
                    } => self.view.sync(&record),
                    Reply::Error { error } => log_warning!("Session data unavailable: {error}"),
                    _ => {}
                }
                self.handshake = Handshake::Done;
                self.start_effect_system(now);
            }
            (Handshake::Done, reply) => log_debug!("Unexpected reply {reply:?}"),
        }
    }

    // # Effect system

    pub fn start_effect_system(&mut self, now: EpochMillis) {
        self.tasks.cancel(ForegroundTask::EffectRefresh);

        if !self.options.visual_degradation_enabled {
            self.clear_all_effects();
            return;
        }

        if self.options.checklist_gate_enabled && !self.todos_loaded {
            self.load_todos();
        }

        self.apply_all_effects(now);

        if self.options.checklist_gate_enabled {
            self.observe_video_state();
        }
        if self.options.video_counter_enabled {
            self.track_video_changes();
            self.render_video_counter();
        }

        self.tasks.schedule_every(
            ForegroundTask::EffectRefresh,
            refresh_interval_ms(self.options.level_interval_minutes),
            now,
        );
    }

    /// Clear everything, re-anchor the page-load time and start again.
    pub fn restart_effect_system(&mut self, now: EpochMillis) {
        self.clear_all_effects();
        self.view.reset_page_load(now);
        self.start_effect_system(now);
    }

    /// Recompute the plan from elapsed time and render it.
    pub fn apply_all_effects(&mut self, now: EpochMillis) {
        if !self.options.visual_degradation_enabled {
            self.clear_all_effects();
            return;
        }

        let plan = plan(&self.options, self.view.elapsed_ms(now));
        render_plan(&mut self.surface, &plan);

        if let Some(delay_ms) = plan.interaction_delay_ms {
            let targets = self.surface.delay_targets();
            self.delays.wrap(&targets, delay_ms);
        }

        if self.current_level() != Some(plan.level) {
            log_debug!(
                "Level {}/{} after {} min",
                plan.level,
                plan.status.max_levels,
                plan.status.elapsed_minutes
            );
        }
        self.current_plan = Some(plan);
    }

    /// Remove every artifact and stop every effect timer. Idempotent.
    pub fn clear_all_effects(&mut self) {
        self.tasks.cancel(ForegroundTask::EffectRefresh);
        self.tasks.cancel(ForegroundTask::ChecklistCountdown);
        self.tasks.cancel(ForegroundTask::ChecklistSettle);
        self.end_screen_watch = false;
        self.gate.clear();
        clear_surface(&mut self.surface);
        self.delays.reset();
        self.current_plan = None;
    }

    // # Navigation and video tracking

    /// In-app navigation finished at `url`.
    pub fn on_navigation(&mut self, url: &str, now: EpochMillis) {
        self.url = url.to_string();
        self.view.reset_page_load(now);

        self.dismiss_overlay();

        // Master switch off keeps the page untouched.
        if !self.options.visual_degradation_enabled {
            self.end_screen_watch = false;
            return;
        }
        if self.options.checklist_gate_enabled {
            self.observe_video_state();
        } else {
            self.end_screen_watch = false;
        }
        if self.options.video_counter_enabled {
            self.track_video_changes();
        }
    }

    fn observe_video_state(&mut self) {
        self.end_screen_watch = sites::is_watch_page(&self.url);
        self.tasks.cancel(ForegroundTask::ChecklistSettle);
    }

    fn track_video_changes(&mut self) {
        if !sites::is_watch_page(&self.url) {
            return;
        }
        let Some(id) = sites::video_id(&self.url) else {
            return;
        };
        if self.current_video_id.as_deref() == Some(id.as_str()) {
            return;
        }
        self.current_video_id = Some(id);
        self.view.videos_watched_count += 1;
        self.outbox.push(Message::UpdateVideosWatched {
            videos_watched: self.view.videos_watched_count,
        });
        self.render_video_counter();
    }

    fn render_video_counter(&mut self) {
        if self.options.video_counter_enabled {
            self.surface
                .show_video_counter(Some(self.view.videos_watched_count));
        }
    }

    // # Checklist gate

    fn load_todos(&mut self) {
        self.todo_items = checklist_items(self.sync.as_ref());
        self.todos_loaded = true;
    }

    pub fn on_playback_event(&mut self, event: PlaybackEvent, now: EpochMillis) {
        if !self.end_screen_watch {
            return;
        }
        match event {
            PlaybackEvent::PlayerMutated => {
                if self.options.checklist_gate_enabled
                    && self.surface.end_screen_visible()
                    && !self.gate.is_visible()
                {
                    self.open_checklist(now);
                }
            }
            PlaybackEvent::Ended => {
                self.tasks
                    .schedule_once(ForegroundTask::ChecklistSettle, CHECKLIST_SETTLE_DELAY_MS, now);
            }
        }
    }

    fn open_checklist(&mut self, now: EpochMillis) {
        if !self.todos_loaded {
            self.load_todos();
        }
        if self.gate.open(&self.todo_items) {
            log_debug!("Checklist shown with {} item(s)", self.todo_items.len());
            self.render_checklist();
            self.tasks.schedule_every(
                ForegroundTask::ChecklistCountdown,
                CHECKLIST_COUNTDOWN_TICK_MS,
                now,
            );
        }
    }

    fn render_checklist(&mut self) {
        let view = self.gate.view();
        self.surface.show_checklist(view.as_ref());
    }

    fn dismiss_overlay(&mut self) {
        self.tasks.cancel(ForegroundTask::ChecklistCountdown);
        self.tasks.cancel(ForegroundTask::ChecklistSettle);
        self.gate.clear();
        self.surface.show_checklist(None);
    }

    pub fn toggle_checklist_item(&mut self, index: usize) -> Option<bool> {
        let completed = self.gate.toggle(index)?;
        self.render_checklist();
        Some(completed)
    }

    pub fn dismiss_checklist(&mut self) -> DismissOutcome {
        let outcome = self.gate.dismiss();
        if outcome == DismissOutcome::Dismissed {
            self.dismiss_overlay();
        }
        outcome
    }

    // # Input and time

    /// A user click on `element`.
    pub fn on_click(&mut self, element: ElementId, now: EpochMillis) -> ClickDecision {
        let decision = self.delays.intercept(element, now);
        match decision {
            ClickDecision::PassThrough => self.surface.dispatch_click(element),
            ClickDecision::Deferred { .. } => self.surface.set_busy(element, true),
        }
        decision
    }

    /// Run timers and deferred clicks due at `now`.
    pub fn tick(&mut self, now: EpochMillis) {
        for task in self.tasks.take_due(now) {
            match task {
                ForegroundTask::EffectRefresh => self.apply_all_effects(now),
                ForegroundTask::SessionReport => self.outbox.push(Message::UpdateSessionTime),
                ForegroundTask::ChecklistCountdown => match self.gate.tick() {
                    GateTick::Counting { .. } => self.render_checklist(),
                    GateTick::Unlocked => {
                        self.tasks.cancel(ForegroundTask::ChecklistCountdown);
                        self.render_checklist();
                    }
                    GateTick::Idle => {
                        self.tasks.cancel(ForegroundTask::ChecklistCountdown);
                    }
                },
                ForegroundTask::ChecklistSettle => {
                    if self.options.checklist_gate_enabled && self.surface.end_screen_visible() {
                        self.open_checklist(now);
                    }
                }
            }
        }

        for element in self.delays.take_due(now) {
            self.surface.set_busy(element, false);
            self.surface.dispatch_click(element);
        }
    }
}
