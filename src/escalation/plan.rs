//! Effect plans: everything the presentation layer needs for one render,
//! computed purely from elapsed time and options.

use serde::Serialize;

use super::color::ColorOverlay;
use super::level::{intensity, level, progression};
use crate::config::Options;
use crate::constants::*;

/// Per-channel visual values for one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualEffects {
    /// `1.0` is untouched saturation.
    pub saturation: f64,
    /// `1.0` is fully opaque.
    pub opacity: f64,
    /// Blur radius in pixels.
    pub blur_px: f64,
}

impl VisualEffects {
    pub const NEUTRAL: VisualEffects = VisualEffects {
        saturation: 1.0,
        opacity: 1.0,
        blur_px: 0.0,
    };

    /// Page-wide CSS filter, `None` when nothing applies.
    pub fn page_filter_css(&self) -> Option<String> {
        let mut filters = Vec::new();
        if self.blur_px > 0.0 {
            filters.push(format!("blur({}px)", self.blur_px));
        }
        if self.saturation < 1.0 {
            filters.push(format!("saturate({})", self.saturation));
        }
        if filters.is_empty() {
            None
        } else {
            Some(filters.join(" "))
        }
    }
}

/// Status indicator contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusIndicator {
    pub level: u32,
    pub max_levels: u32,
    pub elapsed_minutes: u64,
    pub active_effects: Vec<&'static str>,
}

impl StatusIndicator {
    pub fn headline(&self) -> &'static str {
        "Digital Detox Active"
    }

    pub fn summary(&self) -> String {
        format!(
            "Level {}/{} • {}min",
            self.level, self.max_levels, self.elapsed_minutes
        )
    }
}

/// Complete render description for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectPlan {
    pub level: u32,
    pub progression: f64,
    pub visual: VisualEffects,
    /// Brightness/contrast percentage for images, only when fading is on.
    pub image_compensation_percent: Option<f64>,
    /// Click latency, only past level 1 with delays enabled.
    pub interaction_delay_ms: Option<u64>,
    pub color_overlay: Option<ColorOverlay>,
    /// Target playback rate, only with speed adjustment enabled.
    pub playback_rate: Option<f64>,
    pub status: StatusIndicator,
}

/// Names shown in the status indicator, in a fixed order.
pub fn active_effect_names(options: &Options) -> Vec<&'static str> {
    [
        (options.desaturation_enabled, "Desaturation"),
        (options.blur_enabled, "Blur"),
        (options.opacity_enabled, "Fade"),
        (options.interaction_delay_enabled, "Delays"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect()
}

/// `max(0.5, 1 - 0.1 * (level - 1))`.
pub fn playback_rate_for_level(level: u32) -> f64 {
    let reduction = PLAYBACK_STEP_PER_LEVEL * level.saturating_sub(1) as f64;
    (1.0 - reduction).max(PLAYBACK_MIN_RATE)
}

pub fn visual_effects(options: &Options, level: u32) -> VisualEffects {
    let max = options.max_levels;
    VisualEffects {
        saturation: if options.desaturation_enabled {
            1.0 - intensity(
                DESATURATION_MAX,
                options.desaturation_intensity_percent,
                level,
                max,
            )
        } else {
            1.0
        },
        opacity: if options.opacity_enabled {
            1.0 - intensity(FADE_MAX, options.opacity_intensity_percent, level, max)
        } else {
            1.0
        },
        blur_px: if options.blur_enabled {
            intensity(BLUR_MAX_PX, options.blur_intensity_percent, level, max)
        } else {
            0.0
        },
    }
}

/// Build the plan for `elapsed_ms` of accumulated attention.
pub fn plan(options: &Options, elapsed_ms: u64) -> EffectPlan {
    let max = options.max_levels;
    let level = level(elapsed_ms, options.level_interval_minutes, max);
    let progression = progression(level, max);
    let visual = visual_effects(options, level);

    let interaction_delay_ms = (options.interaction_delay_enabled && level > 1)
        .then(|| intensity(INTERACTION_DELAY_MAX_MS, 100.0, level, max).round() as u64);

    EffectPlan {
        level,
        progression,
        visual,
        image_compensation_percent: options.opacity_enabled.then_some(visual.opacity * 100.0),
        interaction_delay_ms,
        color_overlay: options
            .color_temperature_enabled
            .then(|| ColorOverlay::for_progression(progression)),
        playback_rate: options
            .speed_adjust_enabled
            .then(|| playback_rate_for_level(level)),
        status: StatusIndicator {
            level,
            max_levels: max,
            elapsed_minutes: (elapsed_ms as f64 / 60_000.0).round() as u64,
            active_effects: active_effect_names(options),
        },
    }
}
