//! Escalation engine: elapsed attention time in, deterministic effect plan out.
//!
//! Everything in here is pure. Callers own the clock and the options and
//! pass them in; see [`plan::plan`] for the single entry point used by the
//! foreground renderer.

pub mod color;
pub mod level;
pub mod plan;

pub use color::{ColorOverlay, Rgb, kelvin_to_rgb};
pub use level::{intensity, level, progression, refresh_interval_ms};
pub use plan::{EffectPlan, StatusIndicator, VisualEffects, plan};
