//! Command-line argument parsing.
//!
//! Global flags (`--config`, `--debug`, `--help`, `--version`) may appear
//! anywhere; the first non-flag argument selects the command. With no command
//! the status overview is shown, which is what the settings popup opens to.

use crate::constants::{DEFAULT_SIMULATION_STEP_SECS, TRACKED_SITE_URL};

/// Sub-actions of the `todos` command.
#[derive(Debug, Clone, PartialEq)]
pub enum TodosAction {
    List,
    Add(String),
    Remove(usize),
    Clear,
}

/// Parameters of a headless simulated session.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulateParams {
    pub minutes: f64,
    pub step_secs: u64,
    pub site: String,
    pub end_screen_every: Option<f64>,
    pub start: Option<String>,
    pub log_to_file: bool,
}

impl SimulateParams {
    pub fn new(minutes: f64) -> Self {
        Self {
            minutes,
            step_secs: DEFAULT_SIMULATION_STEP_SECS,
            site: TRACKED_SITE_URL.to_string(),
            end_screen_every: None,
            start: None,
            log_to_file: false,
        }
    }
}

/// What the process should do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    Status,
    Get { fields: Vec<String>, json: bool },
    Set { fields: Vec<(String, String)> },
    Preset { name: String },
    Reset,
    Todos(TodosAction),
    Simulate(SimulateParams),
    Help { command: Option<String> },

    ShowHelp,
    ShowVersion,
    /// Usage error; the offending command (if known) selects the usage line.
    ShowUsageError { command: Option<String> },
}

/// Result of parsing command-line arguments.
#[derive(Debug, PartialEq)]
pub struct ParsedArgs {
    pub action: CliAction,
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
}

fn usage_error(command: &str) -> CliAction {
    CliAction::ShowUsageError {
        command: Some(command.to_string()),
    }
}

impl ParsedArgs {
    /// Parse an argument list whose first element is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut config_dir: Option<String> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut bad_global = false;
        let mut positional: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => {
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning_standalone!(
                            "Missing directory for --config. Usage: --config <directory>"
                        );
                        bad_global = true;
                    }
                }
                _ => positional.push(arg.clone()),
            }
            i += 1;
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if bad_global {
            CliAction::ShowUsageError { command: None }
        } else {
            parse_command(&positional)
        };

        ParsedArgs {
            action,
            debug_enabled,
            config_dir,
        }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_command(args: &[String]) -> CliAction {
    let Some((command, rest)) = args.split_first() else {
        return CliAction::Status;
    };

    match command.as_str() {
        "status" | "st" => no_arguments(command, rest, CliAction::Status),
        "reset" => no_arguments(command, rest, CliAction::Reset),
        "get" | "g" => parse_get(rest),
        "set" | "s" => parse_set(rest),
        "preset" | "p" => match rest {
            [name] if !name.starts_with('-') => CliAction::Preset { name: name.clone() },
            _ => {
                log_warning_standalone!("Usage: detoxr preset <gentle|standard|aggressive>");
                usage_error("preset")
            }
        },
        "todos" | "t" => parse_todos(rest),
        "simulate" | "sim" => parse_simulate(rest),
        "help" | "h" => match rest {
            [] => CliAction::Help { command: None },
            [topic] => CliAction::Help {
                command: Some(topic.clone()),
            },
            _ => usage_error("help"),
        },
        unknown => {
            log_warning_standalone!("Unknown command: {}", unknown);
            CliAction::ShowUsageError { command: None }
        }
    }
}

fn no_arguments(command: &str, rest: &[String], action: CliAction) -> CliAction {
    if let Some(extra) = rest.first() {
        log_warning_standalone!("Unexpected argument '{}' for {}", extra, command);
        return usage_error(command);
    }
    action
}

fn parse_get(rest: &[String]) -> CliAction {
    let mut json = false;
    let mut fields = Vec::new();
    for arg in rest {
        match arg.as_str() {
            "--json" | "-j" => json = true,
            flag if flag.starts_with('-') => {
                log_warning_standalone!("Unknown option for get: {}", flag);
                return usage_error("get");
            }
            field => fields.push(field.to_string()),
        }
    }
    if fields.is_empty() {
        log_warning_standalone!("Missing field name. Usage: detoxr get <field>... | all");
        return usage_error("get");
    }
    CliAction::Get { fields, json }
}

fn parse_set(rest: &[String]) -> CliAction {
    let mut fields = Vec::new();
    for arg in rest {
        match arg.split_once('=') {
            Some((field, value)) if !field.is_empty() && !value.is_empty() => {
                fields.push((field.to_string(), value.to_string()));
            }
            _ => {
                log_warning_standalone!("Expected <field>=<value>, got '{}'", arg);
                return usage_error("set");
            }
        }
    }
    if fields.is_empty() {
        log_warning_standalone!("Missing field. Usage: detoxr set <field>=<value>...");
        return usage_error("set");
    }
    CliAction::Set { fields }
}

fn parse_todos(rest: &[String]) -> CliAction {
    let action = match rest {
        [] => TodosAction::List,
        [sub] if sub == "list" => TodosAction::List,
        [sub] if sub == "clear" => TodosAction::Clear,
        [sub, text @ ..] if sub == "add" && !text.is_empty() => TodosAction::Add(text.join(" ")),
        [sub, index] if sub == "remove" => match index.parse::<usize>() {
            Ok(n) if n >= 1 => TodosAction::Remove(n),
            _ => {
                log_warning_standalone!("Item number must be a positive integer: {}", index);
                return usage_error("todos");
            }
        },
        _ => {
            log_warning_standalone!("Usage: detoxr todos [list | add <text> | remove <n> | clear]");
            return usage_error("todos");
        }
    };
    CliAction::Todos(action)
}

fn parse_simulate(rest: &[String]) -> CliAction {
    let mut minutes: Option<f64> = None;
    let mut params = SimulateParams::new(0.0);

    let mut i = 0;
    while i < rest.len() {
        let arg = rest[i].as_str();
        let value = rest.get(i + 1);
        match arg {
            "--log" => params.log_to_file = true,
            "--step" | "--site" | "--end-screen-every" | "--start" => {
                let Some(value) = value else {
                    log_warning_standalone!("Missing value for {}", arg);
                    return usage_error("simulate");
                };
                let ok = match arg {
                    "--step" => value
                        .parse::<u64>()
                        .ok()
                        .filter(|s| *s > 0)
                        .map(|s| params.step_secs = s)
                        .is_some(),
                    "--end-screen-every" => value
                        .parse::<f64>()
                        .ok()
                        .filter(|m| m.is_finite() && *m > 0.0)
                        .map(|m| params.end_screen_every = Some(m))
                        .is_some(),
                    "--site" => {
                        params.site = value.clone();
                        true
                    }
                    _ => {
                        params.start = Some(value.clone());
                        true
                    }
                };
                if !ok {
                    log_warning_standalone!("Invalid value for {}: {}", arg, value);
                    return usage_error("simulate");
                }
                i += 1;
            }
            flag if flag.starts_with('-') => {
                log_warning_standalone!("Unknown option for simulate: {}", flag);
                return usage_error("simulate");
            }
            number if minutes.is_none() => match number.parse::<f64>() {
                Ok(m) if m.is_finite() && m > 0.0 => minutes = Some(m),
                _ => {
                    log_warning_standalone!("Duration must be a positive number of minutes");
                    return usage_error("simulate");
                }
            },
            extra => {
                log_warning_standalone!("Unexpected argument for simulate: {}", extra);
                return usage_error("simulate");
            }
        }
        i += 1;
    }

    match minutes {
        Some(m) => {
            params.minutes = m;
            CliAction::Simulate(params)
        }
        None => {
            log_warning_standalone!("Missing duration. Usage: detoxr simulate <minutes>");
            usage_error("simulate")
        }
    }
}

pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("detoxr [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom storage directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("status, st                 Show options and per-site usage (default)");
    log_indented!("get, g <field>... | all    Read option values");
    log_indented!("set, s <field>=<value>...  Update option values");
    log_indented!("preset, p <name>           Apply a timing preset");
    log_indented!("reset                      Clear all usage statistics");
    log_indented!("todos, t [ACTION]          Manage the pre-leave checklist");
    log_indented!("simulate, sim <minutes>    Run a fast-forwarded headless session");
    log_indented!("help, h [COMMAND]          Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ParsedArgs {
        let mut full = vec!["detoxr"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full)
    }

    #[test]
    fn test_parse_no_args_shows_status() {
        let parsed = parse(&[]);
        assert_eq!(parsed.action, CliAction::Status);
        assert!(!parsed.debug_enabled);
        assert_eq!(parsed.config_dir, None);
    }

    #[test]
    fn test_global_flags_anywhere() {
        let parsed = parse(&["get", "--debug", "max_levels", "--config", "/tmp/d"]);
        assert!(parsed.debug_enabled);
        assert_eq!(parsed.config_dir.as_deref(), Some("/tmp/d"));
        assert_eq!(
            parsed.action,
            CliAction::Get {
                fields: vec!["max_levels".into()],
                json: false
            }
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        assert_eq!(parse(&["--help", "-V"]).action, CliAction::ShowVersion);
        assert_eq!(parse(&["status", "-h"]).action, CliAction::ShowHelp);
    }

    #[test]
    fn test_missing_config_dir() {
        assert_eq!(
            parse(&["--config"]).action,
            CliAction::ShowUsageError { command: None }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse(&["frobnicate"]).action,
            CliAction::ShowUsageError { command: None }
        );
    }

    #[test]
    fn test_get_json_and_all() {
        assert_eq!(
            parse(&["get", "all", "--json"]).action,
            CliAction::Get {
                fields: vec!["all".into()],
                json: true
            }
        );
        assert_eq!(parse(&["get"]).action, usage_error("get"));
    }

    #[test]
    fn test_set_pairs() {
        assert_eq!(
            parse(&["set", "max_levels=7", "blurEnabled=off"]).action,
            CliAction::Set {
                fields: vec![
                    ("max_levels".into(), "7".into()),
                    ("blurEnabled".into(), "off".into())
                ]
            }
        );
        assert_eq!(parse(&["set", "max_levels"]).action, usage_error("set"));
        assert_eq!(parse(&["set", "=3"]).action, usage_error("set"));
        assert_eq!(parse(&["set"]).action, usage_error("set"));
    }

    #[test]
    fn test_preset_requires_one_name() {
        assert_eq!(
            parse(&["preset", "gentle"]).action,
            CliAction::Preset {
                name: "gentle".into()
            }
        );
        assert_eq!(parse(&["p"]).action, usage_error("preset"));
        assert_eq!(parse(&["preset", "a", "b"]).action, usage_error("preset"));
    }

    #[test]
    fn test_reset_takes_no_arguments() {
        assert_eq!(parse(&["reset"]).action, CliAction::Reset);
        assert_eq!(parse(&["reset", "now"]).action, usage_error("reset"));
    }

    #[test]
    fn test_todos_actions() {
        assert_eq!(parse(&["todos"]).action, CliAction::Todos(TodosAction::List));
        assert_eq!(
            parse(&["todos", "add", "Call", "mom"]).action,
            CliAction::Todos(TodosAction::Add("Call mom".into()))
        );
        assert_eq!(
            parse(&["todos", "remove", "2"]).action,
            CliAction::Todos(TodosAction::Remove(2))
        );
        assert_eq!(parse(&["todos", "remove", "0"]).action, usage_error("todos"));
        assert_eq!(
            parse(&["todos", "clear"]).action,
            CliAction::Todos(TodosAction::Clear)
        );
        assert_eq!(parse(&["todos", "add"]).action, usage_error("todos"));
    }

    #[test]
    fn test_simulate_options() {
        let parsed = parse(&[
            "simulate",
            "45",
            "--step",
            "10",
            "--end-screen-every",
            "12.5",
            "--log",
        ]);
        let CliAction::Simulate(params) = parsed.action else {
            panic!("expected simulate, got {:?}", parsed.action);
        };
        assert_eq!(params.minutes, 45.0);
        assert_eq!(params.step_secs, 10);
        assert_eq!(params.end_screen_every, Some(12.5));
        assert!(params.log_to_file);
        assert_eq!(params.site, TRACKED_SITE_URL);
    }

    #[test]
    fn test_simulate_rejects_bad_input() {
        assert_eq!(parse(&["simulate"]).action, usage_error("simulate"));
        assert_eq!(parse(&["simulate", "-5"]).action, usage_error("simulate"));
        assert_eq!(
            parse(&["simulate", "10", "--step", "0"]).action,
            usage_error("simulate")
        );
        assert_eq!(
            parse(&["simulate", "10", "--step"]).action,
            usage_error("simulate")
        );
        assert_eq!(parse(&["simulate", "10", "20"]).action, usage_error("simulate"));
    }

    #[test]
    fn test_help_topic() {
        assert_eq!(
            parse(&["help", "set"]).action,
            CliAction::Help {
                command: Some("set".into())
            }
        );
        assert_eq!(parse(&["help"]).action, CliAction::Help { command: None });
    }
}
