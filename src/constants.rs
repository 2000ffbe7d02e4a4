//! Application-wide constants: option defaults, validation ranges, scheduler
//! cadences and the fixed effect scale factors.

// # Option Defaults

pub const DEFAULT_VISUAL_DEGRADATION: bool = true;
pub const DEFAULT_COLOR_TEMPERATURE: bool = false;
pub const DEFAULT_SPEED_ADJUST: bool = false;
pub const DEFAULT_CHECKLIST_GATE: bool = false;
pub const DEFAULT_VIDEO_COUNTER: bool = false;
pub const DEFAULT_DESATURATION: bool = true;
pub const DEFAULT_BLUR: bool = true;
pub const DEFAULT_OPACITY: bool = true;
pub const DEFAULT_INTERACTION_DELAY: bool = true;
pub const DEFAULT_LEVEL_INTERVAL_MINUTES: f64 = 5.0;
pub const DEFAULT_MAX_LEVELS: u32 = 5;
pub const DEFAULT_BLUR_INTENSITY: f64 = 50.0;
pub const DEFAULT_DESATURATION_INTENSITY: f64 = 75.0;
pub const DEFAULT_OPACITY_INTENSITY: f64 = 60.0;

// # Validation Limits

pub const MINIMUM_LEVEL_INTERVAL_MINUTES: f64 = 0.1; // settings surface only
pub const MAXIMUM_LEVEL_INTERVAL_MINUTES: f64 = 240.0; // settings surface only
pub const MINIMUM_MAX_LEVELS: u32 = 1;
pub const MAXIMUM_MAX_LEVELS: u32 = 20; // settings surface only
pub const MINIMUM_INTENSITY: f64 = 0.0;
pub const MAXIMUM_INTENSITY: f64 = 100.0;

// # Effect Scale Factors

/// Saturation channel fraction removed at full intensity.
pub const DESATURATION_MAX: f64 = 1.0;
/// Opacity removed at full intensity (leaves a 0.3 floor).
pub const FADE_MAX: f64 = 0.7;
/// Blur radius in pixels at full intensity.
pub const BLUR_MAX_PX: f64 = 8.0;
/// Click latency in milliseconds at full intensity.
pub const INTERACTION_DELAY_MAX_MS: f64 = 5000.0;

pub const COLOR_TEMP_START_K: f64 = 1500.0;
pub const COLOR_TEMP_END_K: f64 = 9000.0;
pub const COLOR_OVERLAY_MAX_ALPHA: f64 = 0.7;

pub const PLAYBACK_STEP_PER_LEVEL: f64 = 0.1;
pub const PLAYBACK_MIN_RATE: f64 = 0.5;

// # Scheduler Cadences (milliseconds)

pub const MAX_REFRESH_INTERVAL_MS: u64 = 10_000;
pub const REFRESHES_PER_LEVEL: f64 = 10.0;
pub const SESSION_REPORT_INTERVAL_MS: u64 = 30_000;
pub const ACTIVE_TAB_POLL_INTERVAL_MS: u64 = 5_000;
pub const EXPIRY_SWEEP_INTERVAL_MS: u64 = 60 * 60 * 1000;
pub const SESSION_EXPIRY_MS: i64 = 24 * 60 * 60 * 1000;
pub const CHECKLIST_COUNTDOWN_TICK_MS: u64 = 1_000;
pub const CHECKLIST_SETTLE_DELAY_MS: u64 = 500;

// # Checklist Gate

pub const CHECKLIST_WAIT_SECONDS: u32 = 15;

pub const DEFAULT_CHECKLIST_ITEMS: [&str; 8] = [
    "Read for 15 minutes",
    "Take a 10 minute walk",
    "Drink a glass of water",
    "Call a friend",
    "Clean one area of your room",
    "Write in your journal",
    "Do a 5 minute meditation",
    "Review tomorrow's schedule",
];

// # Site Identity

/// Hostnames (substring match) where the detox is active.
pub const TRACKED_DOMAINS: &[&str] = &["youtube.com"];

pub const WATCH_PAGE_PATH: &str = "/watch";
pub const VIDEO_ID_PARAM: &str = "v";

/// Elements that receive interaction delays.
pub const DELAY_SELECTORS: &[&str] = &[
    "a[href*=\"/watch\"]",
    ".ytp-play-button",
    ".ytp-next-button",
    "[aria-label*=\"Subscribe\"]",
];

// # Storage Keys

pub const OPTIONS_KEY: &str = "options";
pub const SESSIONS_KEY: &str = "sessions";
pub const CUSTOM_TODOS_KEY: &str = "customTodos";
pub const LOCAL_STORE_FILE: &str = "local.json";
pub const SYNC_STORE_FILE: &str = "sync.json";
pub const STORE_LOCK_FILE: &str = ".detoxr.lock";

// # Simulation

/// Page the `simulate` command opens when no `--site` is given.
pub const TRACKED_SITE_URL: &str = "https://www.youtube.com/watch?v=jNQXAC9IVRw";
pub const DEFAULT_SIMULATION_STEP_SECS: u64 = 30;
pub const SIMULATION_LOG_FILE: &str = "detoxr-simulation.log";

// # Exit Codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

// # Test Constants

#[cfg(test)]
pub mod test_constants {
    pub const TEST_DOMAIN: &str = "www.youtube.com";
    pub const TEST_WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    pub const TEST_HOME_URL: &str = "https://www.youtube.com/";
    pub const TEST_UNTRACKED_URL: &str = "https://example.org/watch?v=abc";
    pub const TEST_EPOCH: i64 = 1_760_000_000_000;
    pub const MINUTE_MS: i64 = 60_000;
    pub const HOUR_MS: i64 = 60 * MINUTE_MS;
}
