//! Level and intensity calculations.
//!
//! Elapsed attention time maps to a discrete level in `1..=max_levels`; a level
//! maps to a progression fraction in `[0, 1]`; every effect scales its fixed
//! maximum by the configured percentage and that progression.

use crate::constants::{MAX_REFRESH_INTERVAL_MS, REFRESHES_PER_LEVEL};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Escalation level for the given elapsed time.
///
/// `floor(elapsed_minutes / interval) + 1`, capped at `max_levels`. Level 1
/// starts immediately: degradation is "on" from the first millisecond, just at
/// zero strength.
pub fn level(elapsed_ms: u64, level_interval_minutes: f64, max_levels: u32) -> u32 {
    let max_levels = max_levels.max(1);
    if !(level_interval_minutes > 0.0) {
        return max_levels;
    }
    let elapsed_minutes = elapsed_ms as f64 / MS_PER_MINUTE;
    let steps = (elapsed_minutes / level_interval_minutes).floor();
    if steps >= (max_levels - 1) as f64 {
        max_levels
    } else {
        steps as u32 + 1
    }
}

/// Position of `level` between 1 and `max_levels`, in `[0, 1]`.
///
/// A single-level configuration is treated as fully escalated.
pub fn progression(level: u32, max_levels: u32) -> f64 {
    if max_levels <= 1 {
        return 1.0;
    }
    let fraction = (level.saturating_sub(1)) as f64 / (max_levels - 1) as f64;
    fraction.clamp(0.0, 1.0)
}

/// `max_value * (intensity_percent / 100) * progression(level, max_levels)`.
pub fn intensity(max_value: f64, intensity_percent: f64, level: u32, max_levels: u32) -> f64 {
    max_value * (intensity_percent / 100.0) * progression(level, max_levels)
}

/// Re-render cadence: at most every 10 s, or ten times per level interval.
pub fn refresh_interval_ms(level_interval_minutes: f64) -> u64 {
    let per_level = level_interval_minutes * MS_PER_MINUTE / REFRESHES_PER_LEVEL;
    if !(per_level >= 1.0) {
        return 1;
    }
    (per_level as u64).min(MAX_REFRESH_INTERVAL_MS)
}
