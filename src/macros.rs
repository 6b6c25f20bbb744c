//! Logging macros.
//!
//! Every macro captures `file!()` and `line!()` at the call site and yields a
//! [`RecordBuilder`](crate::RecordBuilder). Values are streamed in with `<<`
//! and the record is submitted when the builder is dropped at the end of the
//! statement. An optional format string is appended first, as with `format!`.
//!
//! # Examples
//!
//! ```no_run
//! use xyz_log::{error, info, log, Logger, LoggerOptions, LogLevel};
//!
//! Logger::init(LoggerOptions::new("server").with_level(LogLevel::Info)).unwrap();
//!
//! let port = 8080;
//! log!(Info) << "Server listening on port " << port;
//! info!("Server listening on port {}", port);
//! error!("Code: {}", 500) << " (retrying)";
//!
//! Logger::shutdown();
//! ```

/// Build a record at the named level.
///
/// `log!(Info)` returns a builder to stream into; `log!(Info, "fmt", args..)`
/// also appends the formatted text.
#[macro_export]
macro_rules! log {
    ($level:ident) => {
        $crate::RecordBuilder::new(file!(), line!(), $crate::LogLevel::$level)
    };
    ($level:ident, $($arg:tt)+) => {{
        let mut builder = $crate::RecordBuilder::new(file!(), line!(), $crate::LogLevel::$level);
        builder.append_fmt(format_args!($($arg)+));
        builder
    }};
}

#[macro_export]
macro_rules! trace {
    () => {
        $crate::log!(Trace)
    };
    ($($arg:tt)+) => {
        $crate::log!(Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    () => {
        $crate::log!(Debug)
    };
    ($($arg:tt)+) => {
        $crate::log!(Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    () => {
        $crate::log!(Info)
    };
    ($($arg:tt)+) => {
        $crate::log!(Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    () => {
        $crate::log!(Warning)
    };
    ($($arg:tt)+) => {
        $crate::log!(Warning, $($arg)+)
    };
}

/// Shorthand for [`warning!`]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::warning!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    () => {
        $crate::log!(Error)
    };
    ($($arg:tt)+) => {
        $crate::log!(Error, $($arg)+)
    };
}

/// Log at `Fatal`. Dropping the builder flushes the sinks and aborts the
/// process.
#[macro_export]
macro_rules! fatal {
    () => {
        $crate::log!(Fatal)
    };
    ($($arg:tt)+) => {
        $crate::log!(Fatal, $($arg)+)
    };
}
