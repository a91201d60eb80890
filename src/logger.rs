// A minimal logger for the `log` crate. Basic levels, stderr output,
// nothing configurable beyond the global max level.

use chrono::Local;
use log::Log;

/// The simplest possible logger that logs to stderr.
///
/// This logger does no filtering. Instead, it relies on the `log` crate's
/// filtering via its global max_level setting.
#[derive(Debug)]
pub struct Logger;

impl Logger {
    /// Install a stderr logger as the global logger.
    pub fn init() -> Result<(), log::SetLoggerError> {
        static LOGGER: Logger = Logger;
        log::set_logger(&LOGGER)
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        // Filtering happens via log::set_max_level.
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                eprintln!("{now}|{}|{file}:{line}: {}", record.level(), record.args());
            }
            _ => {
                eprintln!("{now}|{}: {}", record.level(), record.args());
            }
        }
    }

    fn flush(&self) {
        // eprintln! flushes on every call.
    }
}
