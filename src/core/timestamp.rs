//! Timestamp formatting utilities
//!
//! Two layouts are used by the logger: the millisecond line prefix of every
//! record and the second-resolution stamp embedded in log file names.

use chrono::{DateTime, Local};
use std::fmt::Write;

/// Line prefix: `2025-01-08 10:30:45.123`
pub const LINE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// File name stamp: `2025-01-08_10-30-45`
pub const FILE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp layouts understood by the sinks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45.123`, local time
    #[default]
    LineMillis,

    /// `2025-01-08_10-30-45`, local time, safe inside file names
    FileName,
}

impl TimestampFormat {
    fn pattern(self) -> &'static str {
        match self {
            TimestampFormat::LineMillis => LINE_FORMAT,
            TimestampFormat::FileName => FILE_FORMAT,
        }
    }

    #[must_use]
    pub fn format(self, datetime: &DateTime<Local>) -> String {
        datetime.format(self.pattern()).to_string()
    }

    /// Append the formatted timestamp to `buf` without an intermediate `String`
    pub fn format_into(self, datetime: &DateTime<Local>, buf: &mut String) {
        // Writing into a String cannot fail
        let _ = write!(buf, "{}", datetime.format(self.pattern()));
    }
}
