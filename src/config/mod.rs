//! Options record for detoxr with lenient loading and strict editing.
//!
//! The options live in the local storage partition under the `options` key as
//! a flat JSON object:
//!
//! ```json
//! {
//!   "visualDegradationEnabled": true,
//!   "colorTemperatureEnabled": false,
//!   "speedAdjustEnabled": false,
//!   "checklistGateEnabled": false,
//!   "videoCounterEnabled": false,
//!   "desaturationEnabled": true,
//!   "blurEnabled": true,
//!   "opacityEnabled": true,
//!   "interactionDelayEnabled": true,
//!   "levelIntervalMinutes": 5,
//!   "maxLevels": 5,
//!   "blurIntensityPercent": 50,
//!   "desaturationIntensityPercent": 75,
//!   "opacityIntensityPercent": 60
//! }
//! ```
//!
//! ## Two validation regimes
//!
//! - **Loading** never fails. Every field is resolved on its own: a missing,
//!   mistyped or out-of-range value falls back to its default and is reported
//!   as an issue string. Records written by older versions use different key
//!   names (`visualDegradation`, `todoIntegration`, `levelInterval`, ...);
//!   those are accepted as aliases.
//! - **Editing** through `detoxr set` is strict: bad input is rejected with an
//!   error and nothing is written.
//!
//! Saving always replaces the whole record (shallow, versionless overwrite).

pub mod loading;
pub mod presets;
pub mod validation;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::constants::*;

pub use loading::{config_base_dir, get_custom_config_dir, set_config_dir};
pub use presets::TimingPreset;

/// Runtime options for every context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Master switch for page filters, fade, delays and the status indicator.
    pub visual_degradation_enabled: bool,
    pub color_temperature_enabled: bool,
    pub speed_adjust_enabled: bool,
    pub checklist_gate_enabled: bool,
    pub video_counter_enabled: bool,

    pub desaturation_enabled: bool,
    pub blur_enabled: bool,
    pub opacity_enabled: bool,
    pub interaction_delay_enabled: bool,

    /// Minutes of accrued attention per level step.
    pub level_interval_minutes: f64,
    /// Ceiling on the level, at least 1.
    pub max_levels: u32,

    pub blur_intensity_percent: f64,
    pub desaturation_intensity_percent: f64,
    pub opacity_intensity_percent: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            visual_degradation_enabled: DEFAULT_VISUAL_DEGRADATION,
            color_temperature_enabled: DEFAULT_COLOR_TEMPERATURE,
            speed_adjust_enabled: DEFAULT_SPEED_ADJUST,
            checklist_gate_enabled: DEFAULT_CHECKLIST_GATE,
            video_counter_enabled: DEFAULT_VIDEO_COUNTER,
            desaturation_enabled: DEFAULT_DESATURATION,
            blur_enabled: DEFAULT_BLUR,
            opacity_enabled: DEFAULT_OPACITY,
            interaction_delay_enabled: DEFAULT_INTERACTION_DELAY,
            level_interval_minutes: DEFAULT_LEVEL_INTERVAL_MINUTES,
            max_levels: DEFAULT_MAX_LEVELS,
            blur_intensity_percent: DEFAULT_BLUR_INTENSITY,
            desaturation_intensity_percent: DEFAULT_DESATURATION_INTENSITY,
            opacity_intensity_percent: DEFAULT_OPACITY_INTENSITY,
        }
    }
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Minutes,
    Levels,
    Percent,
}

/// Every editable option, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    VisualDegradation,
    ColorTemperature,
    SpeedAdjust,
    ChecklistGate,
    VideoCounter,
    Desaturation,
    Blur,
    Opacity,
    InteractionDelay,
    LevelInterval,
    MaxLevels,
    BlurIntensity,
    DesaturationIntensity,
    OpacityIntensity,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::VisualDegradation,
        Field::ColorTemperature,
        Field::SpeedAdjust,
        Field::ChecklistGate,
        Field::VideoCounter,
        Field::Desaturation,
        Field::Blur,
        Field::Opacity,
        Field::InteractionDelay,
        Field::LevelInterval,
        Field::MaxLevels,
        Field::BlurIntensity,
        Field::DesaturationIntensity,
        Field::OpacityIntensity,
    ];

    /// snake_case name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Field::VisualDegradation => "visual_degradation_enabled",
            Field::ColorTemperature => "color_temperature_enabled",
            Field::SpeedAdjust => "speed_adjust_enabled",
            Field::ChecklistGate => "checklist_gate_enabled",
            Field::VideoCounter => "video_counter_enabled",
            Field::Desaturation => "desaturation_enabled",
            Field::Blur => "blur_enabled",
            Field::Opacity => "opacity_enabled",
            Field::InteractionDelay => "interaction_delay_enabled",
            Field::LevelInterval => "level_interval_minutes",
            Field::MaxLevels => "max_levels",
            Field::BlurIntensity => "blur_intensity_percent",
            Field::DesaturationIntensity => "desaturation_intensity_percent",
            Field::OpacityIntensity => "opacity_intensity_percent",
        }
    }

    /// camelCase key in the stored JSON record.
    pub fn key(&self) -> &'static str {
        match self {
            Field::VisualDegradation => "visualDegradationEnabled",
            Field::ColorTemperature => "colorTemperatureEnabled",
            Field::SpeedAdjust => "speedAdjustEnabled",
            Field::ChecklistGate => "checklistGateEnabled",
            Field::VideoCounter => "videoCounterEnabled",
            Field::Desaturation => "desaturationEnabled",
            Field::Blur => "blurEnabled",
            Field::Opacity => "opacityEnabled",
            Field::InteractionDelay => "interactionDelayEnabled",
            Field::LevelInterval => "levelIntervalMinutes",
            Field::MaxLevels => "maxLevels",
            Field::BlurIntensity => "blurIntensityPercent",
            Field::DesaturationIntensity => "desaturationIntensityPercent",
            Field::OpacityIntensity => "opacityIntensityPercent",
        }
    }

    /// Key used by records written before the fields were renamed.
    pub fn legacy_key(&self) -> &'static str {
        match self {
            Field::VisualDegradation => "visualDegradation",
            Field::ColorTemperature => "colorTemperature",
            Field::SpeedAdjust => "speedAdjust",
            Field::ChecklistGate => "todoIntegration",
            Field::VideoCounter => "videoCounter",
            Field::Desaturation => "enableDesaturation",
            Field::Blur => "enableBlur",
            Field::Opacity => "enableOpacity",
            Field::InteractionDelay => "enableDelays",
            Field::LevelInterval => "levelInterval",
            Field::MaxLevels => "maxLevels",
            Field::BlurIntensity => "blurIntensity",
            Field::DesaturationIntensity => "desaturationIntensity",
            Field::OpacityIntensity => "opacityIntensity",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::LevelInterval => FieldKind::Minutes,
            Field::MaxLevels => FieldKind::Levels,
            Field::BlurIntensity | Field::DesaturationIntensity | Field::OpacityIntensity => {
                FieldKind::Percent
            }
            _ => FieldKind::Bool,
        }
    }

    /// Human label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            Field::VisualDegradation => "Visual degradation",
            Field::ColorTemperature => "Color temperature shift",
            Field::SpeedAdjust => "Playback slowdown",
            Field::ChecklistGate => "Checklist before next video",
            Field::VideoCounter => "Video counter",
            Field::Desaturation => "Desaturation",
            Field::Blur => "Blur",
            Field::Opacity => "Fade",
            Field::InteractionDelay => "Click delays",
            Field::LevelInterval => "Level interval",
            Field::MaxLevels => "Max levels",
            Field::BlurIntensity => "Blur intensity",
            Field::DesaturationIntensity => "Desaturation intensity",
            Field::OpacityIntensity => "Fade intensity",
        }
    }

    /// Resolve a field from its snake_case name, camelCase key or legacy key.
    pub fn parse(name: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == name || f.key() == name || f.legacy_key() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Integer(u32),
}

impl FieldValue {
    pub fn to_json(self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Integer(i) => Value::from(i),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl Options {
    /// [`Options::from_json`], logging each defaulted field as a warning.
    pub fn resolve(value: &Value) -> Options {
        let (options, issues) = Options::from_json(value);
        for issue in issues {
            log_warning!("Invalid option {issue}");
        }
        options
    }

    /// Resolve options from an arbitrary JSON value, field by field.
    ///
    /// Returns the options plus one message per field that had to be
    /// defaulted. Unknown keys are ignored silently.
    pub fn from_json(value: &Value) -> (Options, Vec<String>) {
        let mut options = Options::default();
        let mut issues = Vec::new();

        let Some(map) = value.as_object() else {
            if !value.is_null() {
                issues.push("options record is not an object, using defaults".to_string());
            }
            return (options, issues);
        };

        for field in Field::ALL {
            let raw = map.get(field.key()).or_else(|| map.get(field.legacy_key()));
            let Some(raw) = raw else { continue };
            if raw.is_null() {
                continue;
            }
            match validation::coerce_stored(field, raw) {
                Ok(v) => {
                    if let Err(e) = options.set(field, v) {
                        issues.push(format!("{}: {e:#}, using default", field.key()));
                    }
                }
                Err(e) => issues.push(format!(
                    "{}: {e}, using default {}",
                    field.key(),
                    Options::default().get(field)
                )),
            }
        }

        (options, issues)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::VisualDegradation => FieldValue::Bool(self.visual_degradation_enabled),
            Field::ColorTemperature => FieldValue::Bool(self.color_temperature_enabled),
            Field::SpeedAdjust => FieldValue::Bool(self.speed_adjust_enabled),
            Field::ChecklistGate => FieldValue::Bool(self.checklist_gate_enabled),
            Field::VideoCounter => FieldValue::Bool(self.video_counter_enabled),
            Field::Desaturation => FieldValue::Bool(self.desaturation_enabled),
            Field::Blur => FieldValue::Bool(self.blur_enabled),
            Field::Opacity => FieldValue::Bool(self.opacity_enabled),
            Field::InteractionDelay => FieldValue::Bool(self.interaction_delay_enabled),
            Field::LevelInterval => FieldValue::Number(self.level_interval_minutes),
            Field::MaxLevels => FieldValue::Integer(self.max_levels),
            Field::BlurIntensity => FieldValue::Number(self.blur_intensity_percent),
            Field::DesaturationIntensity => {
                FieldValue::Number(self.desaturation_intensity_percent)
            }
            Field::OpacityIntensity => FieldValue::Number(self.opacity_intensity_percent),
        }
    }

    /// Assign a value without range checks. Fails only on a kind mismatch.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<()> {
        match (field.kind(), value) {
            (FieldKind::Bool, FieldValue::Bool(b)) => {
                let slot = match field {
                    Field::VisualDegradation => &mut self.visual_degradation_enabled,
                    Field::ColorTemperature => &mut self.color_temperature_enabled,
                    Field::SpeedAdjust => &mut self.speed_adjust_enabled,
                    Field::ChecklistGate => &mut self.checklist_gate_enabled,
                    Field::VideoCounter => &mut self.video_counter_enabled,
                    Field::Desaturation => &mut self.desaturation_enabled,
                    Field::Blur => &mut self.blur_enabled,
                    Field::Opacity => &mut self.opacity_enabled,
                    _ => &mut self.interaction_delay_enabled,
                };
                *slot = b;
            }
            (FieldKind::Minutes, FieldValue::Number(n)) => self.level_interval_minutes = n,
            (FieldKind::Levels, FieldValue::Integer(i)) => self.max_levels = i,
            (FieldKind::Percent, FieldValue::Number(n)) => {
                let slot = match field {
                    Field::BlurIntensity => &mut self.blur_intensity_percent,
                    Field::DesaturationIntensity => &mut self.desaturation_intensity_percent,
                    _ => &mut self.opacity_intensity_percent,
                };
                *slot = n;
            }
            _ => anyhow::bail!("{} cannot hold the value {}", field, value),
        }
        Ok(())
    }

    /// Fields whose value differs from `other`.
    pub fn diff(&self, other: &Options) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f) != other.get(*f))
            .collect()
    }

    /// Log the effective options in the block layout.
    pub fn log_options(&self) {
        log_block_start!("Options");
        for field in Field::ALL {
            let value = self.get(field);
            let shown = match (field.kind(), value) {
                (FieldKind::Bool, FieldValue::Bool(true)) => "on".to_string(),
                (FieldKind::Bool, _) => "off".to_string(),
                (FieldKind::Minutes, v) => format!("{v} minutes"),
                (FieldKind::Percent, FieldValue::Number(p)) => {
                    format!("{} ({p}%)", intensity_label(p))
                }
                (_, v) => v.to_string(),
            };
            log_indented!("{}: {}", field.label(), shown);
        }
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Options::resolve(&value))
    }
}

/// Slider label for an intensity percentage.
pub fn intensity_label(percent: f64) -> &'static str {
    if percent <= 20.0 {
        "Very Low"
    } else if percent <= 40.0 {
        "Low"
    } else if percent <= 60.0 {
        "Medium"
    } else if percent <= 80.0 {
        "High"
    } else {
        "Very High"
    }
}
