//! Structured logging with box-drawing layout.
//!
//! All terminal output goes through the macros in this module so that it
//! shares one visual language:
//!
//! ```text
//! ┏ detoxr v0.3.0 ━━╸
//! ┃
//! ┣ Loaded options
//! ┃   Level interval: 5 minutes
//! ┣[WARNING] Could not persist sessions: disk full
//! ╹
//! ```
//!
//! - `log_block_start!` opens a new conceptual block (empty pipe, then `┣`).
//! - `log_decorated!` continues the current block.
//! - `log_indented!` lists details beneath a block line.
//! - `log_pipe!` inserts vertical spacing before a semantic message.
//! - `log_info!`, `log_warning!`, `log_error!` and `log_debug!` carry a
//!   coloured `[LEVEL]` tag; debug lines only appear with `--debug`.
//! - `log_version!` / `log_end!` open and close the whole output.
//!
//! Output can be switched off process-wide (`Log::set_enabled(false)`) and
//! routed to a file while a simulation runs. When the global time source is
//! simulated every line carries the simulated `[HH:MM:SS]`.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Line shapes understood by [`emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Decorated,
    Indented,
    Pipe,
    BlockStart,
    Version,
    End,
    Info,
    Debug,
    Warning,
    WarningStandalone,
    Error,
    ErrorExit,
}

pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// `log_debug!` lines are dropped unless this is on (`--debug`).
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Route output to `file_path` until the returned guard drops.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;
            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// `[HH:MM:SS] ` of simulated time, or empty when running on the real clock.
    pub fn timestamp_prefix() -> String {
        if crate::time_source::is_initialized() && crate::time_source::is_simulated() {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Keeps file logging alive; flushes and joins the writer on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn tagged(colour: u8, tag: &str) -> String {
    format!("[\x1b[{colour}m{tag}\x1b[0m]")
}

/// Render one message in the given layout and write it out.
pub fn emit(layout: Layout, message: &str) {
    if !Log::is_enabled() || (layout == Layout::Debug && !Log::is_debug()) {
        return;
    }
    let p = Log::timestamp_prefix();
    let text = match layout {
        Layout::Decorated => format!("{p}┣ {message}\n"),
        Layout::Indented => format!("{p}┃   {message}\n"),
        Layout::Pipe => format!("{p}┃\n"),
        Layout::BlockStart => format!("{p}┃\n{p}┣ {message}\n"),
        Layout::Version => format!("{p}┏ detoxr v{} ━━╸\n", env!("CARGO_PKG_VERSION")),
        Layout::End => format!("{p}╹\n"),
        Layout::Info => format!("{p}┣{} {message}\n", tagged(32, "INFO")),
        Layout::Debug => format!("{p}┣{} {message}\n", tagged(32, "DEBUG")),
        Layout::Warning => format!("{p}┣{} {message}\n", tagged(33, "WARNING")),
        Layout::WarningStandalone => format!("{p}{} {message}\n", tagged(33, "WARNING")),
        Layout::Error => format!("{p}┣{} {message}\n", tagged(31, "ERROR")),
        Layout::ErrorExit => format!("{p}┃\n{p}┗{} {message}\n", tagged(31, "ERROR")),
    };
    write_output(&text);
}

pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_layout {
    ($layout:ident, $fmt:literal $($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Layout::$layout, &format!($fmt $($arg)*))
    };
    ($layout:ident, $expr:expr) => {
        $crate::logger::emit($crate::logger::Layout::$layout, &format!("{}", $expr))
    };
}

/// Continue the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($t:tt)*) => { $crate::__log_with_layout!(Decorated, $($t)*) };
}

/// Detail line beneath a block: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($t:tt)*) => { $crate::__log_with_layout!(Indented, $($t)*) };
}

/// Empty `┃` spacer.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::Layout::Pipe, "")
    };
}

/// Open a new block.
#[macro_export]
macro_rules! log_block_start {
    ($($t:tt)*) => { $crate::__log_with_layout!(BlockStart, $($t)*) };
}

#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit($crate::logger::Layout::Version, "")
    };
}

#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::Layout::End, "")
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($t:tt)*) => { $crate::__log_with_layout!(Warning, $($t)*) };
}

/// Warning outside the box layout (argument errors before the header).
#[macro_export]
macro_rules! log_warning_standalone {
    ($($t:tt)*) => { $crate::__log_with_layout!(WarningStandalone, $($t)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => { $crate::__log_with_layout!(Error, $($t)*) };
}

/// Error that terminates the output: `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($t:tt)*) => { $crate::__log_with_layout!(ErrorExit, $($t)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => { $crate::__log_with_layout!(Info, $($t)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($t:tt)*) => { $crate::__log_with_layout!(Debug, $($t)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        let coloured = format!("┣{} disk full", tagged(33, "WARNING"));
        assert_eq!(strip_ansi_codes(&coloured), "┣[WARNING] disk full");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_tagged_wraps_in_colour() {
        assert_eq!(tagged(31, "ERROR"), "[\x1b[31mERROR\x1b[0m]");
    }
}
