//! Preset command: switch the timing pair to gentle, standard or aggressive.

use anyhow::Result;

use super::{Partitions, find_similar, send_settings_message};
use crate::config::TimingPreset;
use crate::messaging::Message;
use crate::storage::load_options;

pub fn handle_preset_command(name: &str) -> Result<()> {
    log_version!();

    let preset = match name.parse::<TimingPreset>() {
        Ok(preset) => preset,
        Err(e) => {
            log_pipe!();
            log_error!("{}", e);
            let names: Vec<String> = TimingPreset::ALL.iter().map(|p| p.to_string()).collect();
            if let Some(closest) = find_similar(name, &names, 1).first() {
                log_block_start!("Did you mean '{}'?", closest);
            }
            log_end!();
            anyhow::bail!("Unknown preset");
        }
    };

    let partitions = Partitions::open()?;
    let mut options = load_options(partitions.local.as_ref());
    if TimingPreset::detect(&options) == Some(preset) {
        log_block_start!("Preset '{}' is already active", preset);
        log_end!();
        return Ok(());
    }

    preset.apply(&mut options);
    send_settings_message(partitions.local.clone(), Message::OptionsUpdated { options });

    log_block_start!("Applied preset '{}'", preset);
    log_indented!("Level interval: {} minutes", preset.level_interval_minutes());
    log_indented!("Max levels: {}", preset.max_levels());
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("preset - Apply a timing preset");
    log_block_start!("Usage: detoxr preset <name>");
    log_block_start!("Presets:");
    for preset in TimingPreset::ALL {
        log_indented!(
            "{:<12} {} minutes per level, {} levels",
            preset.name(),
            preset.level_interval_minutes(),
            preset.max_levels()
        );
    }
    log_indented!("Only the timing fields change; every switch keeps its value.");
    log_end!();
}
