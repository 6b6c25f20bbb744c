//! Per-statement record builder
//!
//! A [`RecordBuilder`] is created by every log statement. It formats the
//! `[file:line] ` prefix and each appended value straight into one growable
//! buffer, and hands that buffer to the logger when it is dropped at the end
//! of the statement. Builders for filtered levels never allocate and drop
//! without side effects.
//!
//! ```no_run
//! use xyz_log::{log, info};
//!
//! let value = 42;
//! log!(Info) << "Test message with value: " << value;
//! info!("formatted {} at once", value);
//! ```

use super::{log_level::LogLevel, logger::Logger};
use std::fmt::{self, Display, Write};
use std::ops::Shl;

const INITIAL_CAPACITY: usize = 128;

/// Strip everything up to the last `/` or `\`
pub fn base_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Single-use builder for one log record.
///
/// Appending consumes and returns the builder, so a finished builder cannot
/// be reused; dropping it submits the record.
pub struct RecordBuilder {
    level: LogLevel,
    file: &'static str,
    line: u32,
    enabled: bool,
    buf: String,
}

impl RecordBuilder {
    #[inline]
    pub fn new(file: &'static str, line: u32, level: LogLevel) -> Self {
        match Logger::route(level) {
            Some(level) => {
                let mut buf = String::with_capacity(INITIAL_CAPACITY);
                let _ = write!(buf, "[{}:{}] ", base_name(file), line);
                Self {
                    level,
                    file,
                    line,
                    enabled: true,
                    buf,
                }
            }
            None => Self {
                level,
                file,
                line,
                enabled: false,
                buf: String::new(),
            },
        }
    }

    /// Level the record will be submitted with
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Source file as captured at the call site
    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether appended values are formatted at all
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Text accumulated so far, prefix included
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Append the textual form of `value`
    #[inline]
    pub fn append<T: Display + ?Sized>(&mut self, value: &T) -> &mut Self {
        if self.enabled {
            let _ = write!(self.buf, "{}", value);
        }
        self
    }

    #[inline]
    pub fn append_str(&mut self, s: &str) -> &mut Self {
        if self.enabled {
            self.buf.push_str(s);
        }
        self
    }

    #[inline]
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if self.enabled {
            let _ = self.buf.write_fmt(args);
        }
        self
    }

    /// Drop the builder without submitting anything
    pub fn discard(mut self) {
        self.enabled = false;
    }
}

impl<T: Display> Shl<T> for RecordBuilder {
    type Output = RecordBuilder;

    #[inline]
    fn shl(mut self, value: T) -> RecordBuilder {
        self.append(&value);
        self
    }
}

impl Write for RecordBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }
}

impl fmt::Debug for RecordBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuilder")
            .field("level", &self.level)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Drop for RecordBuilder {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let message = std::mem::take(&mut self.buf);
        Logger::dispatch(self.level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerOptions;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("src/core/logger.rs"), "logger.rs");
        assert_eq!(base_name("C:\\work\\src\\main.rs"), "main.rs");
        assert_eq!(base_name("mixed/dir\\file.rs"), "file.rs");
        assert_eq!(base_name("plain.rs"), "plain.rs");
        assert_eq!(base_name("trailing/"), "");
    }

    #[test]
    #[serial]
    fn test_prefix_and_appends() {
        Logger::shutdown();
        let mut builder = RecordBuilder::new("/home/me/project/src/main.rs", 42, LogLevel::Info);
        builder.append("Hello world ").append(&123).append(&' ').append(&3.5);
        assert_eq!(builder.as_str(), "[main.rs:42] Hello world 123 3.5");
        builder.discard();
    }

    #[test]
    #[serial]
    fn test_shift_operator_chain() {
        Logger::shutdown();
        let builder = RecordBuilder::new("a/b.rs", 7, LogLevel::Warning) << "Warn value: " << 2.5 << " " << -2i64;
        assert_eq!(builder.as_str(), "[b.rs:7] Warn value: 2.5 -2");
        builder.discard();
    }

    #[test]
    #[serial]
    fn test_fmt_write() {
        Logger::shutdown();
        let mut builder = RecordBuilder::new("x.rs", 1, LogLevel::Error);
        write!(builder, "{}-{:03}", "id", 7).unwrap();
        assert_eq!(builder.as_str(), "[x.rs:1] id-007");
        builder.discard();
    }

    #[test]
    #[serial]
    fn test_filtered_builder_does_no_work() {
        Logger::shutdown();
        let dir = tempdir().unwrap();
        Logger::init(LoggerOptions::new("filtered").with_log_dir(dir.path()).with_async(false))
            .unwrap();

        let builder = RecordBuilder::new("f.rs", 3, LogLevel::Debug) << "expensive " << 99;
        assert!(!builder.is_enabled());
        assert!(builder.as_str().is_empty());
        assert_eq!(builder.buf.capacity(), 0);
        drop(builder);

        assert_eq!(Logger::metrics().unwrap().submitted(), 0);
        Logger::shutdown();
    }

    #[test]
    #[serial]
    fn test_drop_submits_record() {
        Logger::shutdown();
        let dir = tempdir().unwrap();
        Logger::init(
            LoggerOptions::new("submit")
                .with_log_dir(dir.path())
                .with_async(false)
                .with_level(LogLevel::Info),
        )
        .unwrap();
        let file = Logger::current_log_file().unwrap();

        let _ = RecordBuilder::new("src/lib.rs", 10, LogLevel::Info) << "value=" << 5;
        Logger::shutdown();

        let content = fs::read_to_string(file).unwrap();
        assert!(content.contains("[INFO]"));
        assert!(content.contains("[lib.rs:10] value=5"));
    }
}
