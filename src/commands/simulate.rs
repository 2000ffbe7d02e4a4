//! Simulate command: a fast-forwarded headless session on one tracked page.
//!
//! A simulated clock is installed, a [`Runtime`] is seeded with a copy of the
//! stored options and checklist, and time is advanced step by step. Level
//! changes, checklist activity and delayed clicks are logged as they happen.
//! Stored statistics are never modified.

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use std::sync::Arc;
use std::time::Duration;

use super::Partitions;
use crate::args::SimulateParams;
use crate::checklist::GateState;
use crate::constants::SIMULATION_LOG_FILE;
use crate::effects::{ClickDecision, ElementId};
use crate::foreground::PlaybackEvent;
use crate::logger::Log;
use crate::messaging::TabId;
use crate::runtime::Runtime;
use crate::sites;
use crate::storage::{MemoryArea, load_custom_todos, load_options, save_custom_todos, save_options};
use crate::time_source::{self, SimulatedTimeSource};

/// What the simulation observed; logged at the end and used by tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimulationSummary {
    pub final_level: u32,
    pub level_changes: u32,
    pub checklists_shown: u32,
    pub delayed_clicks: u32,
    pub videos_watched: u64,
    pub accrued_ms: u64,
}

/// Drives a runtime through one simulated session.
pub struct Simulation {
    runtime: Runtime,
    tab: TabId,
    controls: Vec<ElementId>,
    end_screen_every_ms: Option<i64>,
    last_end_screen: i64,
    awaiting_next_video: bool,
    videos_started: u32,
    last_level: Option<u32>,
    last_gate: GateState,
    domain: String,
    summary: SimulationSummary,
}

impl Simulation {
    /// Open `params.site` in a fresh runtime at `now`.
    pub fn new(
        params: &SimulateParams,
        local: Arc<MemoryArea>,
        sync: Arc<MemoryArea>,
        now: i64,
    ) -> Result<Self> {
        if !sites::is_tracked_site(&params.site) {
            anyhow::bail!("{} is not a tracked site", params.site);
        }
        let domain = sites::domain_from_url(&params.site)
            .with_context(|| format!("No hostname in {}", params.site))?;

        let mut runtime = Runtime::new(local, sync, now);
        let tab = runtime.open_tab(&params.site);
        let controls = runtime
            .foreground_mut(tab)
            .map(|fg| fg.surface_mut().populate_player_controls())
            .unwrap_or_default();

        Ok(Self {
            runtime,
            tab,
            controls,
            end_screen_every_ms: params
                .end_screen_every
                .map(|minutes| (minutes * 60_000.0).round() as i64),
            last_end_screen: now,
            awaiting_next_video: false,
            videos_started: 0,
            last_level: None,
            last_gate: GateState::Hidden,
            domain,
            summary: SimulationSummary::default(),
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn summary(&self) -> &SimulationSummary {
        &self.summary
    }

    /// Advance to `now` and react to whatever the page shows.
    pub fn step(&mut self, now: i64) {
        self.runtime.advance_to(now);
        self.observe();

        if self.awaiting_next_video {
            self.try_next_video();
        } else if let Some(every) = self.end_screen_every_ms
            && now - self.last_end_screen >= every
        {
            self.end_video(now);
        }
    }

    fn end_video(&mut self, now: i64) {
        self.last_end_screen = now;
        self.awaiting_next_video = true;
        if let Some(fg) = self.runtime.foreground_mut(self.tab) {
            fg.surface_mut().set_end_screen(true);
        }
        log_block_start!("Video ended");
        self.runtime.playback_event(self.tab, PlaybackEvent::Ended);
    }

    /// Leave the end screen once the checklist (if any) lets the user go.
    fn try_next_video(&mut self) {
        let Some(fg) = self.runtime.foreground_mut(self.tab) else {
            return;
        };
        match fg.gate().state() {
            GateState::Shown { .. } => return,
            GateState::Unlocked => {
                fg.dismiss_checklist();
                log_decorated!("Checklist dismissed");
            }
            GateState::Hidden => {}
        }
        fg.surface_mut().set_end_screen(false);
        let url = fg.url().to_string();
        self.awaiting_next_video = false;

        if let Some(&next_button) = self.controls.get(2).or(self.controls.first()) {
            match self.runtime.click(self.tab, next_button) {
                Some(ClickDecision::Deferred { fire_at }) if fire_at > self.runtime.now() => {
                    self.summary.delayed_clicks += 1;
                    log_decorated!(
                        "Next-video click delayed by {:.1}s",
                        (fire_at - self.runtime.now()) as f64 / 1000.0
                    );
                }
                _ => {}
            }
        }

        self.videos_started += 1;
        let id = format!("sim{:04}", self.videos_started);
        if let Some(next) = sites::with_video_id(&url, &id) {
            log_decorated!("Now watching {}", id);
            self.runtime.navigate(self.tab, &next);
        }
    }

    fn observe(&mut self) {
        let Some(fg) = self.runtime.foreground(self.tab) else {
            return;
        };

        let level = fg.current_level();
        if level.is_some() && level != self.last_level {
            if let Some(plan) = fg.current_plan() {
                let active = plan.status.active_effects.join(", ");
                log_block_start!("Level {}/{}", plan.level, plan.status.max_levels);
                log_indented!("Attention counted: {} min", plan.status.elapsed_minutes);
                if !active.is_empty() {
                    log_indented!("Active effects: {}", active);
                }
                if let Some(rate) = plan.playback_rate {
                    log_indented!("Playback speed: {:.1}x", rate);
                }
                if let Some(overlay) = plan.color_overlay {
                    log_indented!("Colour temperature: {:.0}K", overlay.kelvin);
                }
            }
            if self.last_level.is_some() {
                self.summary.level_changes += 1;
            }
            self.last_level = level;
        }

        let gate = fg.gate().state();
        let opened = !matches!(self.last_gate, GateState::Shown { .. } | GateState::Unlocked);
        match gate {
            GateState::Shown { remaining_secs } if opened => {
                self.summary.checklists_shown += 1;
                log_decorated!("Checklist shown, dismiss unlocks in {}s", remaining_secs);
            }
            GateState::Unlocked if self.last_gate != GateState::Unlocked => {
                log_decorated!("Checklist can now be dismissed");
            }
            _ => {}
        }
        self.last_gate = gate;

        if let Some(record) = self.runtime.background().session_for(&self.domain) {
            let credited = record
                .total_active_time_ms
                .saturating_sub(self.summary.accrued_ms);
            if credited > 0 {
                log_debug!("Accrued {} ms on {}", credited, self.domain);
            }
            self.summary.accrued_ms = record.total_active_time_ms;
            self.summary.videos_watched = record.videos_watched_count;
        }
        self.summary.final_level = self.last_level.unwrap_or(1);
    }
}

pub fn handle_simulate_command(params: &SimulateParams) -> Result<()> {
    let start = match &params.start {
        Some(text) => {
            time_source::parse_datetime(text).map_err(|e| anyhow::anyhow!("Invalid start time: {e}"))?
        }
        None => Local::now(),
    };
    let end = start + ChronoDuration::milliseconds((params.minutes * 60_000.0).round() as i64);
    time_source::init_time_source(Arc::new(SimulatedTimeSource::new(start, end)));

    let _log_guard = if params.log_to_file {
        let guard = Log::start_file_logging(SIMULATION_LOG_FILE.to_string())?;
        println!("Writing simulation log to {SIMULATION_LOG_FILE}");
        Some(guard)
    } else {
        None
    };

    log_version!();

    // Work on copies so the simulation never touches stored statistics.
    let partitions = Partitions::open()?;
    let local = Arc::new(MemoryArea::new("local (simulated)"));
    let sync = Arc::new(MemoryArea::new("sync (simulated)"));
    let options = load_options(partitions.local.as_ref());
    save_options(local.as_ref(), &options)?;
    if let Some(todos) = load_custom_todos(partitions.sync.as_ref())? {
        save_custom_todos(sync.as_ref(), &todos)?;
    }

    log_block_start!(
        "Simulating {} minutes on {} ({}s steps)",
        params.minutes,
        params.site,
        params.step_secs
    );
    if !options.visual_degradation_enabled {
        log_indented!("Visual degradation is off; pages stay untouched");
    }
    if params.end_screen_every.is_some() && !options.checklist_gate_enabled {
        log_indented!("The checklist gate is off; videos end without a checklist");
    }

    let mut simulation = Simulation::new(params, local, sync, time_source::now_millis())?;
    simulation.step(time_source::now_millis());

    while !time_source::simulation_ended() {
        time_source::sleep(Duration::from_secs(params.step_secs));
        simulation.step(time_source::now_millis());
    }

    let summary = simulation.summary();
    log_block_start!("Simulation complete");
    log_indented!("Final level: {}", summary.final_level);
    log_indented!("Level changes: {}", summary.level_changes);
    log_indented!(
        "Attention counted: {:.1} min",
        summary.accrued_ms as f64 / 60_000.0
    );
    log_indented!("Videos watched: {}", summary.videos_watched);
    log_indented!("Checklists shown: {}", summary.checklists_shown);
    log_indented!("Delayed clicks: {}", summary.delayed_clicks);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Run a fast-forwarded headless session");
    log_block_start!("Usage: detoxr simulate <minutes> [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("--step <seconds>            Simulated seconds per step (default 30)");
    log_indented!("--site <url>                Tracked page to open");
    log_indented!("--end-screen-every <min>    End the current video periodically");
    log_indented!("--start <datetime>          Start at \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("--log                       Write output to {}", SIMULATION_LOG_FILE);
    log_block_start!("Description:");
    log_indented!("Uses the stored options and checklist. Statistics are not changed.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::constants::test_constants::*;

    fn simulation(options: &Options, end_screen_every: Option<f64>) -> Simulation {
        let local = Arc::new(MemoryArea::new("local"));
        save_options(local.as_ref(), options).unwrap();
        let mut params = SimulateParams::new(30.0);
        params.site = TEST_WATCH_URL.to_string();
        params.end_screen_every = end_screen_every;
        Simulation::new(&params, local, Arc::new(MemoryArea::new("sync")), TEST_EPOCH).unwrap()
    }

    fn run(sim: &mut Simulation, minutes: i64, step_ms: i64) {
        let mut now = TEST_EPOCH;
        while now < TEST_EPOCH + minutes * MINUTE_MS {
            now += step_ms;
            sim.step(now);
        }
    }

    #[test]
    fn test_untracked_site_rejected() {
        let mut params = SimulateParams::new(5.0);
        params.site = TEST_UNTRACKED_URL.to_string();
        let result = Simulation::new(
            &params,
            Arc::new(MemoryArea::new("local")),
            Arc::new(MemoryArea::new("sync")),
            TEST_EPOCH,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_levels_climb_over_session() {
        let mut sim = simulation(&Options::default(), None);
        run(&mut sim, 20, 30_000);

        let summary = sim.summary();
        assert_eq!(summary.final_level, 5);
        assert!(summary.level_changes >= 4);
        assert_eq!(summary.accrued_ms, 20 * MINUTE_MS as u64);
    }

    #[test]
    fn test_end_screens_show_checklist_and_count_videos() {
        let options = Options {
            checklist_gate_enabled: true,
            video_counter_enabled: true,
            ..Options::default()
        };
        let mut sim = simulation(&options, Some(5.0));
        run(&mut sim, 16, 5_000);

        let summary = sim.summary().clone();
        assert_eq!(summary.checklists_shown, 3);
        assert!(summary.videos_watched >= 3);
        assert!(summary.delayed_clicks >= 1);
    }
}
