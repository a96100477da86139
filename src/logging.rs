//! A small stdout-backed `log::Log` sink, formatted the way the original
//! tracker formatted its own log lines: `[YYYY-MM-DD HH:MM:SS] [LEVEL] name: message`.

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes accepted records to stdout with a UTC timestamp.
///
/// `Critical` has no direct equivalent in the `log` crate; callers map it
/// onto `Level::Error` and the message carries a `(critical)` marker (see
/// `log_critical!`).
pub struct StdoutLogger {
    name: &'static str,
    min_level: Level,
}

impl StdoutLogger {
    pub fn new(name: &'static str, min_level: Level) -> Self {
        Self { name, min_level }
    }

    /// Installs this logger as the global `log` sink. Call once at process
    /// start; a second call anywhere in the process will return an error.
    pub fn install(name: &'static str, min_level: Level) -> Result<(), log::SetLoggerError> {
        log::set_max_level(level_filter(min_level));
        log::set_boxed_logger(Box::new(Self::new(name, min_level)))
    }
}

fn level_filter(level: Level) -> LevelFilter {
    match level {
        Level::Error => LevelFilter::Error,
        Level::Warn => LevelFilter::Warn,
        Level::Info => LevelFilter::Info,
        Level::Debug => LevelFilter::Debug,
        Level::Trace => LevelFilter::Trace,
    }
}

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.min_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        println!(
            "[{timestamp}] [{}] {}: {}",
            record.level(),
            self.name,
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Logs at `Critical` severity. The `log` crate has no such level, so this
/// emits at `Error` with a `(critical)` marker in the message, matching
/// the documented level mapping.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        ::log::error!("(critical) {}", format!($($arg)+))
    };
}

/// A sink that drops every record; used in tests so `cargo test`'s
/// single-process-global logger doesn't collide across suites.
pub struct NullLogger;

impl Log for NullLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        false
    }

    fn log(&self, _record: &Record) {}

    fn flush(&self) {}
}
