//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::cell::Cell;

// Thread-local cache for the numeric thread id to avoid re-deriving it per record
thread_local! {
    static THREAD_ID_CACHE: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
pub(crate) fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| match cache.get() {
        Some(id) => id,
        None => {
            let id = numeric_thread_id(std::thread::current().id());
            cache.set(Some(id));
            id
        }
    })
}

// `ThreadId::as_u64` is unstable; its Debug form is `ThreadId(N)`.
fn numeric_thread_id(id: std::thread::ThreadId) -> u64 {
    format!("{:?}", id)
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// One finished log message plus its severity, as handed to the delivery
/// engine.
///
/// The timestamp and thread id are captured on the producing thread so the
/// asynchronous worker reports when and where the record was created, not
/// when it was drained.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub thread_id: u64,
    /// `[file:line] message` as built by the record builder
    pub message: String,
}

impl Record {
    pub fn new(level: LogLevel, message: String) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            thread_id: current_thread_id(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_is_cached_and_distinct() {
        let here = current_thread_id();
        assert_eq!(here, current_thread_id());

        let other = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, other);
    }

    #[test]
    fn test_record_captures_producer_thread() {
        let record = Record::new(LogLevel::Info, "[main.rs:1] hi".to_string());
        assert_eq!(record.thread_id, current_thread_id());
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.message, "[main.rs:1] hi");
    }
}
