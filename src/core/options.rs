//! Logger configuration
//!
//! [`LoggerOptions`] is the only configuration surface of the logger. It is
//! passed once to [`Logger::init`](crate::Logger::init) and treated as
//! immutable afterwards; the minimum level is the only value that can change
//! while the logger is running.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Program name used when none is configured.
pub const DEFAULT_PROGRAM_NAME: &str = "xyz_app";

/// Directory created under `$HOME` when no log directory is configured.
pub const DEFAULT_DIR_NAME: &str = ".xyz_log";

/// Default async queue capacity, in records.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32_768;

/// Default rotation threshold (10 MiB).
pub const DEFAULT_MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Implementation selected at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    /// Formatter/sink pipeline with optional async delivery.
    #[default]
    Pipeline,
    /// Same pipeline, plus crash-signal capture. Filters TRACE and DEBUG as
    /// INFO and rotates on whole mebibytes.
    CrashCapture,
}

/// Configuration for a logging session.
///
/// # Example
///
/// ```
/// use xyz_log::{LoggerOptions, LogLevel};
///
/// let options = LoggerOptions::new("demo")
///     .with_log_dir("/tmp/testlogs")
///     .with_console(true)
///     .with_level(LogLevel::Debug)
///     .with_max_log_size(1024 * 1024);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub program_name: String,
    /// Base directory. `None` means `$HOME/.xyz_log`.
    pub log_dir: Option<PathBuf>,
    pub enable_console: bool,
    pub async_mode: bool,
    pub multi_thread: bool,
    pub async_queue_size: usize,
    pub log_level: LogLevel,
    pub max_log_size: u64,
    /// Only honored by [`Backend::CrashCapture`].
    pub enable_crash_capture: bool,
    pub backend: Backend,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            log_dir: None,
            enable_console: false,
            async_mode: true,
            multi_thread: true,
            async_queue_size: DEFAULT_QUEUE_CAPACITY,
            log_level: LogLevel::Error,
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            enable_crash_capture: true,
            backend: Backend::Pipeline,
        }
    }
}

impl LoggerOptions {
    #[must_use]
    pub fn new(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.enable_console = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_async(mut self, enabled: bool) -> Self {
        self.async_mode = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_multi_thread(mut self, enabled: bool) -> Self {
        self.multi_thread = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_queue_size(mut self, capacity: usize) -> Self {
        self.async_queue_size = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_log_size(mut self, bytes: u64) -> Self {
        self.max_log_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_crash_capture(mut self, enabled: bool) -> Self {
        self.enable_crash_capture = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Check the options for values no backend can work with.
    pub fn validate(&self) -> Result<()> {
        if self.program_name.is_empty() {
            return Err(LoggerError::config("LoggerOptions", "program name must not be empty"));
        }
        if self.program_name.contains(['/', '\\']) {
            return Err(LoggerError::config(
                "LoggerOptions",
                format!("program name '{}' must not contain path separators", self.program_name),
            ));
        }
        if self.async_mode && self.async_queue_size == 0 {
            return Err(LoggerError::config(
                "LoggerOptions",
                "async queue capacity must be positive",
            ));
        }
        if self.max_log_size == 0 {
            return Err(LoggerError::config(
                "LoggerOptions",
                "max log size must be positive",
            ));
        }
        Ok(())
    }

    /// Directory the log files of this program go to:
    /// `<base>/<program_name>`, where base defaults to `$HOME/.xyz_log`
    /// (or `./.xyz_log` when no home directory is known).
    #[must_use]
    pub fn resolve_log_dir(&self) -> PathBuf {
        let base = match &self.log_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => default_base_dir(),
        };
        base.join(&self.program_name)
    }

    /// Minimum level as enforced by the selected backend.
    #[must_use]
    pub fn effective_level(&self) -> LogLevel {
        self.backend.effective_level(self.log_level)
    }

    /// Rotation threshold as enforced by the selected backend.
    #[must_use]
    pub fn effective_max_log_size(&self) -> u64 {
        match self.backend {
            Backend::Pipeline => self.max_log_size,
            Backend::CrashCapture => {
                const MIB: u64 = 1024 * 1024;
                (self.max_log_size / MIB).max(1) * MIB
            }
        }
    }
}

impl Backend {
    /// Map a level onto the severities this backend distinguishes.
    #[must_use]
    pub fn effective_level(self, level: LogLevel) -> LogLevel {
        match (self, level) {
            (Backend::CrashCapture, LogLevel::Trace | LogLevel::Debug) => LogLevel::Info,
            _ => level,
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| Path::new(".").join(DEFAULT_DIR_NAME))
}
