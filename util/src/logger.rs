//! Console and session log file output
//!
//! The console and the session log file are filtered separately, so an executable can keep its
//! terminal quiet while the log file records the detail of every search. Console lines carry a
//! coloured level tag, file lines are plain and always include the message target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{debug, Level};
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Minimum levels written to each log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevels {
    /// Level for stderr
    pub console: LevelFilter,

    /// Level for the session's log file
    pub file: LevelFilter,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Cannot open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger has already been set: {0}")]
    SetLogger(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LogLevels {
    fn default() -> Self {
        Self {
            console: LevelFilter::Info,
            file: LevelFilter::Debug,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Start logging to stderr and to the session's log file.
///
/// Stdout is never written to. Can only be called once per process.
pub fn logger_init(levels: LogLevels, session: &Session) -> Result<(), LoggerInitError> {
    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.3} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                message
            ))
        })
        .level(levels.console)
        .chain(std::io::stderr());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {:<5}] {}: {}",
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(levels.file)
        .chain(log_file);

    fern::Dispatch::new()
        .level(levels.console.max(levels.file))
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::SetLogger)?;

    debug!(
        "Logging to the console at {} and to {:?} at {}",
        levels.console, session.log_file_path, levels.file
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Fixed width coloured tag for a console line.
fn level_tag(level: Level) -> ColoredString {
    let padded = format!("{:<5}", level);
    let tag = padded.as_str();

    match level {
        Level::Error => tag.red().bold(),
        Level::Warn => tag.yellow(),
        Level::Info => tag.green(),
        Level::Debug => tag.cyan(),
        Level::Trace => tag.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
