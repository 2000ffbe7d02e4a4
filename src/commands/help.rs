//! Help command: general overview or detailed help for one command.

use anyhow::Result;

/// Brief usage line for a command, shown after argument errors.
pub fn show_command_usage(command: Option<&str>) {
    match command {
        Some("get" | "g") => log_block_start!("Usage: detoxr get [--json] <field>... | all"),
        Some("set" | "s") => log_block_start!("Usage: detoxr set <field>=<value>..."),
        Some("preset" | "p") => log_block_start!("Usage: detoxr preset <name>"),
        Some("reset") => log_block_start!("Usage: detoxr reset"),
        Some("status" | "st") => log_block_start!("Usage: detoxr status"),
        Some("todos" | "t") => {
            log_block_start!("Usage: detoxr todos [list | add <text> | remove <n> | clear]")
        }
        Some("simulate" | "sim") => log_block_start!("Usage: detoxr simulate <minutes> [OPTIONS]"),
        Some("help" | "h") => log_block_start!("Usage: detoxr help [COMMAND]"),
        _ => log_block_start!("Usage: detoxr [OPTIONS] [COMMAND]"),
    }
    log_indented!("Run 'detoxr --help' for more information");
}

pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("get" | "g") => super::get::display_help(),
        Some("set" | "s") => super::set::display_help(),
        Some("preset" | "p") => super::preset::display_help(),
        Some("reset") => super::reset::display_help(),
        Some("status" | "st") => super::status::display_help(),
        Some("todos" | "t") => super::todos::display_help(),
        Some("simulate" | "sim") => super::simulate::display_help(),
        Some("help" | "h") => display_help_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("status, st                 Show options and per-site usage");
    log_indented!("get, g <field>... | all    Read option values");
    log_indented!("set, s <field>=<value>...  Update option values");
    log_indented!("preset, p <name>           Apply a timing preset");
    log_indented!("reset                      Clear all usage statistics");
    log_indented!("todos, t [ACTION]          Manage the pre-leave checklist");
    log_indented!("simulate, sim <minutes>    Run a fast-forwarded headless session");
    log_indented!("help, h [COMMAND]          Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'detoxr help <command>' to see detailed help for a specific command.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: detoxr help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("detoxr help");
    log_indented!("detoxr help set");
    log_end!();
}
