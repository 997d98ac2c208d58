use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::time::SystemTime;

const RESET: &str = "\x1b[0m";
const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        ::log::info!(target: "vexel_png", "{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::info!(target: "vexel_png", $fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {
        ::log::debug!(target: "vexel_png", "{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::debug!(target: "vexel_png", $fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        ::log::warn!(target: "vexel_png", "{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::warn!(target: "vexel_png", $fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        ::log::error!(target: "vexel_png", "{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::error!(target: "vexel_png", $fmt, $($arg)*)
    };
}

static LOGGER: Logger = Logger {};

/// Terminal logger with colored levels and wall-clock timestamps.
///
/// The library only emits records through the `log` facade; binaries decide
/// whether to install this logger.
pub struct Logger {}

impl Logger {
    /// Installs the logger as the global `log` backend.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);

        Ok(())
    }

    fn get_timestamp() -> String {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        let (secs, millis) = (now.as_secs(), now.subsec_millis());

        let hours = (secs / 3600) % 24;
        let minutes = (secs / 60) % 60;
        let seconds = secs % 60;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let (level_str, color) = match record.level() {
            Level::Trace => ("TRACE", BLUE),
            Level::Debug => ("DEBUG", BLUE),
            Level::Info => ("INFO", GREEN),
            Level::Warn => ("WARN", YELLOW),
            Level::Error => ("ERROR", RED),
        };

        eprintln!(
            "{} [{}{}{}] {}",
            Self::get_timestamp(),
            color,
            level_str,
            RESET,
            record.args()
        );
    }

    fn flush(&self) {}
}
