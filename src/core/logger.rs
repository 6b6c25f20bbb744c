//! Process-wide logger state
//!
//! A single [`LoggerState`] lives behind a `parking_lot::RwLock`. `init` and
//! `shutdown` take the write side so concurrent initializations collapse into
//! one; producers only take the read side while handing a record to the
//! delivery engine, so they never wait on each other.
//!
//! The active minimum level is mirrored in an atomic so record builders can
//! reject filtered records without touching the lock.

use super::{
    crash,
    engine::{DeliveryEngine, DeliveryMode},
    error::Result,
    log_level::LogLevel,
    metrics::DeliveryMetrics,
    options::{Backend, LoggerOptions, DEFAULT_PROGRAM_NAME},
    record::Record,
    sink::SinkSet,
    timestamp::TimestampFormat,
};
use crate::sinks::{ConsoleSink, RotatingFileSink};
use chrono::Local;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

/// Level reported by [`Logger::get_level`] while no session is active
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Error;

/// Longest wait for the async worker to confirm the flush before a fatal abort
pub const FATAL_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period between the fatal flush and the abort
pub const FATAL_GRACE_PERIOD: Duration = Duration::from_millis(50);

struct LoggerState {
    options: LoggerOptions,
    engine: DeliveryEngine,
    log_dir: PathBuf,
    log_file: Option<Arc<Mutex<PathBuf>>>,
}

static STATE: RwLock<Option<LoggerState>> = parking_lot::const_rwlock(None);
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static MIN_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_LOG_LEVEL.as_u8());
static COLLAPSE_LOW_LEVELS: AtomicBool = AtomicBool::new(false);

/// Entry point of the logging facade.
///
/// `Logger` is never instantiated; all operations act on the process-wide
/// session.
///
/// # Example
///
/// ```no_run
/// use xyz_log::{info, Logger, LoggerOptions, LogLevel};
///
/// Logger::init(LoggerOptions::new("demo").with_level(LogLevel::Info)).unwrap();
/// info!() << "Hello world " << 123;
/// Logger::shutdown();
/// ```
pub enum Logger {}

impl Logger {
    /// Start a logging session.
    ///
    /// Does nothing and returns `Ok` if a session is already active. A file
    /// sink that cannot be created is reported on stderr and skipped; the
    /// session still starts.
    ///
    /// # Errors
    ///
    /// Invalid options or a delivery worker that cannot be started. The error
    /// is also reported on stderr and the logger stays uninitialized.
    pub fn init(options: LoggerOptions) -> Result<()> {
        let mut state = STATE.write();
        if state.is_some() {
            return Ok(());
        }

        if let Err(e) = options.validate() {
            eprintln!("[LOGGER ERROR] Logger init failed: {}", e);
            return Err(e);
        }

        let log_dir = options.resolve_log_dir();
        let (sinks, log_file) = build_sinks(&options, &log_dir);

        let mode = if options.async_mode {
            DeliveryMode::Async {
                capacity: options.async_queue_size,
            }
        } else {
            DeliveryMode::Sync {
                multi_thread: options.multi_thread,
            }
        };
        let engine = DeliveryEngine::start(sinks, mode).map_err(|e| {
            eprintln!("[LOGGER ERROR] Logger init failed: {}", e);
            e
        })?;

        if options.backend == Backend::CrashCapture && options.enable_crash_capture {
            let stamp = TimestampFormat::FileName.format(&Local::now());
            crash::install(&crash::report_path_for(&log_dir, &options.program_name, &stamp));
        }

        COLLAPSE_LOW_LEVELS.store(options.backend == Backend::CrashCapture, Ordering::SeqCst);
        MIN_LEVEL.store(options.effective_level().as_u8(), Ordering::SeqCst);
        INITIALIZED.store(true, Ordering::SeqCst);

        *state = Some(LoggerState {
            options,
            engine,
            log_dir,
            log_file,
        });
        Ok(())
    }

    /// End the session: drain queued records, flush and close the sinks and
    /// stop the worker. Calling it again, or before `init`, does nothing.
    pub fn shutdown() {
        let mut guard = STATE.write();
        let Some(mut state) = guard.take() else {
            return;
        };
        INITIALIZED.store(false, Ordering::SeqCst);
        MIN_LEVEL.store(DEFAULT_LOG_LEVEL.as_u8(), Ordering::SeqCst);
        COLLAPSE_LOW_LEVELS.store(false, Ordering::SeqCst);

        state.engine.shutdown();
    }

    #[inline]
    pub fn is_initialized() -> bool {
        INITIALIZED.load(Ordering::Acquire)
    }

    /// Program name of the active session, or `xyz_app` when none is active
    pub fn program_name() -> String {
        STATE
            .read()
            .as_ref()
            .map(|state| state.options.program_name.clone())
            .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string())
    }

    /// Change the minimum level of the active session. No-op when uninitialized.
    pub fn set_level(level: LogLevel) {
        let mut guard = STATE.write();
        let Some(state) = guard.as_mut() else {
            return;
        };
        state.options.log_level = level;
        MIN_LEVEL.store(state.options.effective_level().as_u8(), Ordering::SeqCst);
    }

    /// Minimum level of the active session, [`DEFAULT_LOG_LEVEL`] otherwise
    pub fn get_level() -> LogLevel {
        STATE
            .read()
            .as_ref()
            .map(|state| state.options.log_level)
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Options of the active session
    pub fn options() -> Option<LoggerOptions> {
        STATE.read().as_ref().map(|state| state.options.clone())
    }

    /// `<base>/<program>` directory of the active session
    pub fn log_dir() -> Option<PathBuf> {
        STATE.read().as_ref().map(|state| state.log_dir.clone())
    }

    /// File the active session is writing to, following rotations
    pub fn current_log_file() -> Option<PathBuf> {
        STATE
            .read()
            .as_ref()
            .and_then(|state| state.log_file.as_ref())
            .map(|path| path.lock().clone())
    }

    /// Snapshot of the delivery counters of the active session
    pub fn metrics() -> Option<DeliveryMetrics> {
        STATE.read().as_ref().map(|state| state.engine.metrics().clone())
    }

    /// Write out everything submitted so far. No-op when uninitialized.
    pub fn flush() -> Result<()> {
        match STATE.read().as_ref() {
            Some(state) => state.engine.flush(),
            None => Ok(()),
        }
    }

    /// Level a record at `level` is emitted with, or `None` when the active
    /// minimum filters it out. Without a session every record passes so it
    /// can reach the stderr fallback.
    #[inline]
    pub fn route(level: LogLevel) -> Option<LogLevel> {
        if !Self::is_initialized() {
            return Some(level);
        }
        let level = if COLLAPSE_LOW_LEVELS.load(Ordering::Relaxed) {
            Backend::CrashCapture.effective_level(level)
        } else {
            level
        };
        (level.as_u8() >= MIN_LEVEL.load(Ordering::Relaxed)).then_some(level)
    }

    #[inline]
    pub fn would_log(level: LogLevel) -> bool {
        Self::route(level).is_some()
    }

    /// Deliver a finished message.
    ///
    /// Without a session the message goes to stderr. A `Fatal` message is
    /// flushed to the sinks and then aborts the process.
    pub fn dispatch(level: LogLevel, message: String) {
        let guard = STATE.read();

        let Some(state) = guard.as_ref() else {
            drop(guard);
            eprintln!("{}", message);
            if level == LogLevel::Fatal {
                fatal_abort();
            }
            return;
        };

        if let Err(e) = state.engine.submit(Record::new(level, message)) {
            eprintln!("[LOGGER ERROR] Failed to deliver log record: {}", e);
        }

        if level == LogLevel::Fatal {
            match state.engine.flush_timeout(FATAL_FLUSH_TIMEOUT) {
                Ok(true) => {}
                Ok(false) => eprintln!("[LOGGER WARNING] Fatal flush timed out; aborting anyway"),
                Err(e) => eprintln!("[LOGGER ERROR] Fatal flush failed: {}", e),
            }
            drop(guard);
            fatal_abort();
        }
    }
}

fn fatal_abort() -> ! {
    std::thread::sleep(FATAL_GRACE_PERIOD);
    std::process::abort();
}

fn build_sinks(options: &LoggerOptions, log_dir: &Path) -> (SinkSet, Option<Arc<Mutex<PathBuf>>>) {
    let mut sinks = SinkSet::new();
    let mut log_file = None;

    match RotatingFileSink::new(log_dir, &options.program_name, options.effective_max_log_size()) {
        Ok(sink) => {
            log_file = Some(sink.active_path());
            sinks.push(Box::new(sink));
        }
        Err(e) => {
            eprintln!("[LOGGER ERROR] File sink unavailable, continuing without it: {}", e);
        }
    }

    if options.enable_console {
        sinks.push(Box::new(ConsoleSink::new()));
    }

    (sinks, log_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_accessors_before_init() {
        Logger::shutdown();
        assert!(!Logger::is_initialized());
        Logger::set_level(LogLevel::Trace);
        assert_eq!(Logger::get_level(), DEFAULT_LOG_LEVEL);
        assert_eq!(Logger::program_name(), DEFAULT_PROGRAM_NAME);
        assert!(Logger::flush().is_ok());
        assert!(Logger::metrics().is_none());
        assert_eq!(Logger::route(LogLevel::Trace), Some(LogLevel::Trace));
    }

    #[test]
    #[serial]
    fn test_route_filters_by_min_level() {
        Logger::shutdown();
        let dir = tempdir().unwrap();
        Logger::init(LoggerOptions::new("route").with_log_dir(dir.path()).with_level(LogLevel::Warning))
            .unwrap();

        assert_eq!(Logger::route(LogLevel::Info), None);
        assert_eq!(Logger::route(LogLevel::Warning), Some(LogLevel::Warning));
        assert_eq!(Logger::route(LogLevel::Fatal), Some(LogLevel::Fatal));

        Logger::set_level(LogLevel::Trace);
        assert_eq!(Logger::get_level(), LogLevel::Trace);
        assert_eq!(Logger::route(LogLevel::Trace), Some(LogLevel::Trace));

        Logger::shutdown();
    }

    #[test]
    #[serial]
    fn test_crash_backend_routes_low_levels_as_info() {
        Logger::shutdown();
        let dir = tempdir().unwrap();
        Logger::init(
            LoggerOptions::new("collapse")
                .with_log_dir(dir.path())
                .with_backend(Backend::CrashCapture)
                .with_crash_capture(false)
                .with_level(LogLevel::Debug),
        )
        .unwrap();

        assert_eq!(Logger::get_level(), LogLevel::Debug);
        assert_eq!(Logger::route(LogLevel::Trace), Some(LogLevel::Info));
        assert_eq!(Logger::route(LogLevel::Debug), Some(LogLevel::Info));

        Logger::set_level(LogLevel::Warning);
        assert_eq!(Logger::route(LogLevel::Debug), None);

        Logger::shutdown();
    }

    #[test]
    #[serial]
    fn test_invalid_options_leave_logger_uninitialized() {
        Logger::shutdown();
        let result = Logger::init(LoggerOptions::new("bad").with_queue_size(0));
        assert!(result.is_err());
        assert!(!Logger::is_initialized());
    }
}
