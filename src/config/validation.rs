//! Field value validation.
//!
//! [`coerce_stored`] is used when reading a stored record and only enforces
//! what the escalation math needs (positive interval, at least one level,
//! percentages in range). [`parse_cli_value`] backs `detoxr set` and applies
//! the tighter ranges the settings surface offers.

use anyhow::{Context, Result};
use serde_json::Value;

use super::{Field, FieldKind, FieldValue};
use crate::constants::*;

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_percent(percent: f64) -> Result<f64> {
    if !(MINIMUM_INTENSITY..=MAXIMUM_INTENSITY).contains(&percent) {
        anyhow::bail!(
            "intensity must be between {}% and {}%",
            MINIMUM_INTENSITY,
            MAXIMUM_INTENSITY
        );
    }
    Ok(percent)
}

fn whole_levels(levels: f64) -> Result<u32> {
    if levels.fract() != 0.0 || levels < MINIMUM_MAX_LEVELS as f64 || levels > u32::MAX as f64 {
        anyhow::bail!("max levels must be a whole number of at least {MINIMUM_MAX_LEVELS}");
    }
    Ok(levels as u32)
}

/// Validate a value read from storage.
pub fn coerce_stored(field: Field, value: &Value) -> Result<FieldValue> {
    match field.kind() {
        FieldKind::Bool => value
            .as_bool()
            .map(FieldValue::Bool)
            .context("expected true or false"),
        FieldKind::Minutes => {
            let minutes = json_number(value).context("expected a number of minutes")?;
            if !(minutes.is_finite() && minutes > 0.0) {
                anyhow::bail!("level interval must be positive");
            }
            Ok(FieldValue::Number(minutes))
        }
        FieldKind::Levels => {
            let levels = json_number(value).context("expected a whole number")?;
            Ok(FieldValue::Integer(whole_levels(levels)?))
        }
        FieldKind::Percent => {
            let percent = json_number(value).context("expected a percentage")?;
            Ok(FieldValue::Number(check_percent(percent)?))
        }
    }
}

/// Normalize boolean spellings before TOML parsing.
fn normalize_bool(value: &str) -> &str {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => "true",
        "false" | "no" | "off" | "0" => "false",
        _ => value,
    }
}

/// Parse and validate a command-line value for `field`.
pub fn parse_cli_value(field: Field, value: &str) -> Result<FieldValue> {
    let value = value.trim();
    let literal = if field.kind() == FieldKind::Bool {
        normalize_bool(value)
    } else {
        value
    };

    let document = format!("value = {literal}");
    let parsed: toml::Value = document
        .parse()
        .with_context(|| format!("Invalid value '{value}' for {field}"))?;
    let parsed = parsed.get("value").context("Failed to extract field value")?;

    let number = || {
        parsed
            .as_float()
            .or_else(|| parsed.as_integer().map(|i| i as f64))
    };

    match field.kind() {
        FieldKind::Bool => {
            let b = parsed.as_bool().context("Must be true or false")?;
            Ok(FieldValue::Bool(b))
        }
        FieldKind::Minutes => {
            let minutes = number().context("Level interval must be a number (minutes)")?;
            if !(MINIMUM_LEVEL_INTERVAL_MINUTES..=MAXIMUM_LEVEL_INTERVAL_MINUTES)
                .contains(&minutes)
            {
                anyhow::bail!(
                    "Level interval must be between {} and {} minutes",
                    MINIMUM_LEVEL_INTERVAL_MINUTES,
                    MAXIMUM_LEVEL_INTERVAL_MINUTES
                );
            }
            Ok(FieldValue::Number(minutes))
        }
        FieldKind::Levels => {
            let levels = parsed
                .as_integer()
                .context("Max levels must be an integer")?;
            if levels < MINIMUM_MAX_LEVELS as i64 || levels > MAXIMUM_MAX_LEVELS as i64 {
                anyhow::bail!(
                    "Max levels must be between {} and {}",
                    MINIMUM_MAX_LEVELS,
                    MAXIMUM_MAX_LEVELS
                );
            }
            Ok(FieldValue::Integer(levels as u32))
        }
        FieldKind::Percent => {
            let percent = number().context("Intensity must be a number (percent)")?;
            let percent = check_percent(percent).map_err(|_| {
                anyhow::anyhow!(
                    "Intensity must be between {}% and {}%",
                    MINIMUM_INTENSITY,
                    MAXIMUM_INTENSITY
                )
            })?;
            Ok(FieldValue::Number(percent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_stored_accepts_numeric_strings() {
        assert_eq!(
            coerce_stored(Field::LevelInterval, &json!("7")).unwrap(),
            FieldValue::Number(7.0)
        );
        assert_eq!(
            coerce_stored(Field::MaxLevels, &json!(4.0)).unwrap(),
            FieldValue::Integer(4)
        );
    }

    #[test]
    fn test_coerce_stored_rejects_bad_values() {
        assert!(coerce_stored(Field::Blur, &json!("yes")).is_err());
        assert!(coerce_stored(Field::LevelInterval, &json!(0)).is_err());
        assert!(coerce_stored(Field::LevelInterval, &json!(-3)).is_err());
        assert!(coerce_stored(Field::MaxLevels, &json!(0)).is_err());
        assert!(coerce_stored(Field::MaxLevels, &json!(2.5)).is_err());
        assert!(coerce_stored(Field::BlurIntensity, &json!(101)).is_err());
    }

    #[test]
    fn test_stored_interval_has_no_upper_bound() {
        assert_eq!(
            coerce_stored(Field::LevelInterval, &json!(600)).unwrap(),
            FieldValue::Number(600.0)
        );
    }

    #[test]
    fn test_parse_cli_bool_spellings() {
        for spelling in ["true", "yes", "ON", "1"] {
            assert_eq!(
                parse_cli_value(Field::Blur, spelling).unwrap(),
                FieldValue::Bool(true)
            );
        }
        for spelling in ["false", "no", "off", "0"] {
            assert_eq!(
                parse_cli_value(Field::Blur, spelling).unwrap(),
                FieldValue::Bool(false)
            );
        }
        assert!(parse_cli_value(Field::Blur, "maybe").is_err());
    }

    #[test]
    fn test_parse_cli_ranges() {
        assert_eq!(
            parse_cli_value(Field::LevelInterval, "2.5").unwrap(),
            FieldValue::Number(2.5)
        );
        assert!(parse_cli_value(Field::LevelInterval, "0.05").is_err());
        assert!(parse_cli_value(Field::LevelInterval, "241").is_err());
        assert!(parse_cli_value(Field::MaxLevels, "21").is_err());
        assert!(parse_cli_value(Field::MaxLevels, "3.5").is_err());
        assert_eq!(
            parse_cli_value(Field::OpacityIntensity, "100").unwrap(),
            FieldValue::Number(100.0)
        );
        assert!(parse_cli_value(Field::OpacityIntensity, "-1").is_err());
    }
}
