//! Color-temperature model.
//!
//! Kelvin → RGB through the usual closed-form blackbody fit (two branches
//! split at 6600K, one logarithmic and one power term per channel). The
//! result is laid over the page with a screen-blend overlay whose strength
//! follows the escalation progression.

use serde::{Deserialize, Serialize};

use crate::constants::{COLOR_OVERLAY_MAX_ALPHA, COLOR_TEMP_END_K, COLOR_TEMP_START_K};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Tinted overlay for the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorOverlay {
    pub kelvin: f64,
    pub rgb: Rgb,
    pub alpha: f64,
}

impl ColorOverlay {
    pub fn for_progression(progression: f64) -> Self {
        let kelvin = temperature_for_progression(progression);
        Self {
            kelvin,
            rgb: kelvin_to_rgb(kelvin),
            alpha: overlay_alpha(progression),
        }
    }

    /// CSS `rgba(...)` background for the overlay element.
    pub fn css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.rgb.r, self.rgb.g, self.rgb.b, self.alpha
        )
    }
}

/// 1500K at level 1, 9000K at the top level, linear in between.
pub fn temperature_for_progression(progression: f64) -> f64 {
    COLOR_TEMP_START_K + (COLOR_TEMP_END_K - COLOR_TEMP_START_K) * progression
}

pub fn overlay_alpha(progression: f64) -> f64 {
    (progression * COLOR_OVERLAY_MAX_ALPHA).min(COLOR_OVERLAY_MAX_ALPHA)
}

fn channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Approximate RGB for a color temperature in Kelvin.
pub fn kelvin_to_rgb(kelvin: f64) -> Rgb {
    let t = kelvin / 100.0;

    let (r, g, b) = if t <= 66.0 {
        let g = 99.4708025861 * t.ln() - 161.1195681661;
        let b = if t <= 19.0 {
            0.0
        } else {
            138.5177312231 * (t - 10.0).ln() - 305.0447927307
        };
        (255.0, g, b)
    } else {
        let r = 329.698727446 * (t - 60.0).powf(-0.1332047592);
        let g = 288.1221695283 * (t - 60.0).powf(-0.0755148492);
        (r, g, 255.0)
    };

    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    #[test]
    fn test_reference_endpoints() {
        assert_eq!(kelvin_to_rgb(1500.0), rgb(255, 108, 0));
        assert_eq!(kelvin_to_rgb(9000.0), rgb(210, 223, 255));
    }

    #[test]
    fn test_branch_boundary() {
        assert_eq!(kelvin_to_rgb(6600.0), rgb(255, 255, 253));
        assert_eq!(kelvin_to_rgb(6700.0), rgb(254, 249, 255));
    }

    #[test]
    fn test_intermediate_temperatures() {
        assert_eq!(kelvin_to_rgb(3375.0), rgb(255, 189, 134));
        assert_eq!(kelvin_to_rgb(5250.0), rgb(255, 233, 214));
        assert_eq!(kelvin_to_rgb(7125.0), rgb(239, 240, 255));
    }

    #[test]
    fn test_degenerate_input_clamps() {
        assert_eq!(kelvin_to_rgb(0.0), rgb(255, 0, 0));
        assert_eq!(kelvin_to_rgb(-50.0), rgb(255, 0, 0));
    }

    #[test]
    fn test_overlay_follows_progression() {
        let start = ColorOverlay::for_progression(0.0);
        assert_eq!(start.kelvin, 1500.0);
        assert_eq!(start.alpha, 0.0);

        let top = ColorOverlay::for_progression(1.0);
        assert_eq!(top.kelvin, 9000.0);
        assert!((top.alpha - 0.7).abs() < 1e-12);
        assert_eq!(top.css(), "rgba(210, 223, 255, 0.7)");
    }
}
