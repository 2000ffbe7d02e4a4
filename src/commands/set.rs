//! Set command: validate and store option values.
//!
//! Every pair is validated before anything is written, so one bad value
//! leaves the stored record untouched.

use anyhow::Result;

use super::{Partitions, resolve_field, send_settings_message};
use crate::config::validation::parse_cli_value;
use crate::config::{Field, FieldValue, Options};
use crate::messaging::Message;
use crate::storage::load_options;

/// Validate every pair and apply it to a copy of `current`.
pub fn apply_fields(current: &Options, pairs: &[(String, String)]) -> Result<Options> {
    let mut validated: Vec<(Field, FieldValue)> = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        let Some(field) = resolve_field(name) else {
            anyhow::bail!("Unknown field '{}'", name);
        };
        match parse_cli_value(field, value) {
            Ok(v) => validated.push((field, v)),
            Err(e) => {
                log_error!("Invalid value for field '{}': {:#}", field, e);
                anyhow::bail!("Option validation failed");
            }
        }
    }

    let mut updated = current.clone();
    for (field, value) in validated {
        updated.set(field, value)?;
    }
    Ok(updated)
}

pub fn handle_set_command(pairs: &[(String, String)]) -> Result<()> {
    log_version!();

    let partitions = Partitions::open()?;
    let current = load_options(partitions.local.as_ref());
    let updated = apply_fields(&current, pairs)?;

    let changed = updated.diff(&current);
    if changed.is_empty() {
        log_block_start!("Options unchanged");
        log_indented!("All fields already have the specified values");
        log_end!();
        return Ok(());
    }

    send_settings_message(
        partitions.local.clone(),
        Message::OptionsUpdated {
            options: updated.clone(),
        },
    );

    log_block_start!("Updated options");
    for field in changed {
        log_indented!("{} = {}", field.name(), updated.get(field));
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("set - Update option values");
    log_block_start!("Usage: detoxr set <field>=<value> [<field>=<value>...]");
    log_block_start!("Values:");
    log_indented!("Switches accept true/false, yes/no, on/off or 1/0");
    log_indented!("level_interval_minutes   0.1 to 240");
    log_indented!("max_levels               1 to 20");
    log_indented!("*_intensity_percent      0 to 100");
    log_block_start!("Examples:");
    log_indented!("detoxr set color_temperature_enabled=on");
    log_indented!("detoxr set level_interval_minutes=2.5 max_levels=8");
    log_indented!("Run 'detoxr help get' for the list of fields.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_fields_updates_copy() {
        let current = Options::default();
        let updated = apply_fields(
            &current,
            &pairs(&[("max_levels", "8"), ("speedAdjustEnabled", "yes")]),
        )
        .unwrap();
        assert_eq!(updated.max_levels, 8);
        assert!(updated.speed_adjust_enabled);
        assert_eq!(updated.diff(&current), vec![Field::SpeedAdjust, Field::MaxLevels]);
    }

    #[test]
    fn test_apply_fields_is_all_or_nothing() {
        let current = Options::default();
        assert!(
            apply_fields(
                &current,
                &pairs(&[("max_levels", "8"), ("blur_intensity_percent", "150")])
            )
            .is_err()
        );
        assert!(apply_fields(&current, &pairs(&[("night_temp", "3000")])).is_err());
    }
}
