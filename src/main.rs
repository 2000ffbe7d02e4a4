//! Command-line entry point for detoxr.
//!
//! Parses arguments, applies the global flags (`--config`, `--debug`) and
//! dispatches to the command handlers in the library. Errors are printed in
//! the log layout and turned into a non-zero exit code.

use detoxr::args::{self, CliAction, ParsedArgs};
use detoxr::commands;
use detoxr::config;
use detoxr::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use detoxr::logger::Log;
use detoxr::{log_end, log_error_exit};

fn run(action: CliAction) -> anyhow::Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowUsageError { command } => {
            commands::help::show_command_usage(command.as_deref());
            log_end!();
            anyhow::bail!("Invalid arguments")
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Status => commands::status::handle_status_command(),
        CliAction::Get { fields, json } => commands::get::handle_get_command(&fields, json),
        CliAction::Set { fields } => commands::set::handle_set_command(&fields),
        CliAction::Preset { name } => commands::preset::handle_preset_command(&name),
        CliAction::Reset => commands::reset::handle_reset_command(),
        CliAction::Todos(action) => commands::todos::handle_todos_command(&action),
        CliAction::Simulate(params) => commands::simulate::handle_simulate_command(&params),
    }
}

fn main() {
    let parsed = ParsedArgs::from_env();
    Log::set_debug(parsed.debug_enabled);

    if let Err(e) = config::set_config_dir(parsed.config_dir) {
        log_error_exit!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }

    let usage_error = matches!(parsed.action, CliAction::ShowUsageError { .. });
    match run(parsed.action) {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(_) if usage_error => std::process::exit(EXIT_FAILURE),
        Err(e) => {
            log_error_exit!("{:#}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}
