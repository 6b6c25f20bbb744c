//! # xyz_log
//!
//! A streaming logging facade: `log!(Info) << "value " << 42;` builds a
//! record at the call site and hands it to a process-wide logger that writes
//! timestamped, size-rotated files and optionally mirrors to a colored
//! console.
//!
//! ## Features
//!
//! - **Cheap filtering**: records below the minimum level are never formatted
//! - **Async pipeline**: a bounded queue and a single writer thread keep
//!   per-producer ordering and block producers instead of dropping records
//! - **Rotation**: `<program>_<timestamp>.log` files capped by size
//! - **Crash capture**: an optional backend that writes a FATAL report on
//!   SIGSEGV, SIGILL, SIGFPE, SIGABRT or panic
//!
//! ```no_run
//! use xyz_log::{info, log, Logger, LoggerOptions, LogLevel};
//!
//! Logger::init(
//!     LoggerOptions::new("my_app")
//!         .with_level(LogLevel::Info)
//!         .with_console(true),
//! )
//! .unwrap();
//!
//! log!(Info) << "Hello world " << 123;
//! info!("{} records queued", 1);
//!
//! Logger::shutdown();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        Backend, DeliveryMetrics, LogLevel, Logger, LoggerError, LoggerOptions, RecordBuilder,
        Result,
    };
    pub use crate::{debug, error, fatal, info, log, trace, warn, warning};
}

pub use crate::core::{
    Backend, DeliveryEngine, DeliveryMetrics, DeliveryMode, LogLevel, Logger, LoggerError,
    LoggerOptions, Record, RecordBuilder, Result, Sink, SinkSet, TimestampFormat,
    DEFAULT_LOG_LEVEL,
};
pub use sinks::{ConsoleSink, RotatingFileSink};
