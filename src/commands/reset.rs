//! Reset command: clear the usage statistics of every site.

use anyhow::Result;

use super::{Partitions, send_settings_message};
use crate::messaging::Message;

pub fn handle_reset_command() -> Result<()> {
    log_version!();
    let partitions = Partitions::open()?;
    send_settings_message(partitions.local.clone(), Message::ResetSessions);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("reset - Clear all usage statistics");
    log_block_start!("Usage: detoxr reset");
    log_block_start!("Description:");
    log_indented!("Forgets the attention time and video counts of every site.");
    log_indented!("Escalation starts again from level 1. Options are kept.");
    log_end!();
}
