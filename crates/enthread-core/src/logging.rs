//! Stderr backend for the `log` facade
//!
//! Library code logs through `log::{error, warn, info, debug, trace}`.
//! Binaries that do not bring their own logger can install this one,
//! which writes whole lines to a locked stderr.
//!
//! # Environment Variables
//!
//! - `ENT_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5)
//! - `ENT_FLUSH_EPRINT=1` - Flush stderr after each line (useful when a
//!   thread is about to be killed)
//!
//! # Usage
//!
//! ```ignore
//! enthread_core::logging::init();
//! log::info!("thread {} started", id);
//! ```

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let thread = std::thread::current();
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(
            handle,
            "[{:<5}] [{}] {}",
            record.level(),
            thread.name().unwrap_or("-"),
            record.args()
        );
        if FLUSH_ENABLED.load(Ordering::Relaxed) {
            let _ = handle.flush();
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Parse a level name or digit as accepted by `ENT_LOG_LEVEL`
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    let level = match value.trim().to_lowercase().as_str() {
        "off" | "0" => LevelFilter::Off,
        "error" | "1" => LevelFilter::Error,
        "warn" | "2" => LevelFilter::Warn,
        "info" | "3" => LevelFilter::Info,
        "debug" | "4" => LevelFilter::Debug,
        "trace" | "5" => LevelFilter::Trace,
        _ => return None,
    };
    Some(level)
}

/// Install the stderr logger, reading the environment
///
/// Returns `false` if a logger was already installed (by this function or
/// by the application); the existing logger is left alone.
pub fn init() -> bool {
    if let Ok(val) = std::env::var("ENT_FLUSH_EPRINT") {
        let flush = matches!(val.as_str(), "1" | "true" | "yes" | "on");
        FLUSH_ENABLED.store(flush, Ordering::Relaxed);
    }
    let level = std::env::var("ENT_LOG_LEVEL")
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info);

    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(level);
            true
        }
        Err(_) => false,
    }
}

/// Change the level after `init`
pub fn set_log_level(level: LevelFilter) {
    log::set_max_level(level);
}

pub fn set_flush_enabled(enabled: bool) {
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}
