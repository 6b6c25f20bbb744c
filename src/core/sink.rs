//! Sink trait for log output destinations

use super::{error::Result, record::Record, timestamp::TimestampFormat};
use std::fmt::Write;

pub trait Sink: Send {
    fn write(&mut self, record: &Record) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}

/// Render `[<timestamp>] [<level>] [<thread id>] <message>` into `buf`.
///
/// `level` is passed pre-rendered so the console can substitute a colored
/// form. No trailing newline is written.
pub fn format_line(record: &Record, level: &dyn std::fmt::Display, buf: &mut String) {
    buf.push('[');
    TimestampFormat::LineMillis.format_into(&record.timestamp, buf);
    let _ = write!(buf, "] [{}] [{}] ", level, record.thread_id);
    buf.push_str(&record.message);
}

/// Ordered collection of sinks fed by the delivery engine.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn Sink>>,
}

impl SinkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Write one record to every sink.
    ///
    /// Each sink is isolated: an error or panic in one is reported on stderr
    /// and the remaining sinks still receive the record. Returns `false` if
    /// any sink failed.
    pub fn write(&mut self, record: &Record) -> bool {
        let mut ok = true;
        for sink in self.sinks.iter_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                sink.write(record)
            }));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", sink.name(), e);
                    ok = false;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink '{}' panicked: {}. \
                         Other sinks continue to function.",
                        sink.name(),
                        panic_message(&*panic_info)
                    );
                    ok = false;
                }
            }
        }
        ok
    }

    /// Flush every sink with the same isolation as [`write`](Self::write).
    pub fn flush(&mut self) -> bool {
        let mut ok = true;
        for sink in self.sinks.iter_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.flush()));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", sink.name(), e);
                    ok = false;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
                        sink.name(),
                        panic_message(&*panic_info)
                    );
                    ok = false;
                }
            }
        }
        ok
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LoggerError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct CollectingSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl Sink for CollectingSink {
        fn write(&mut self, record: &Record) -> Result<()> {
            self.lines.lock().push(record.message.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "collecting"
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn write(&mut self, _record: &Record) -> Result<()> {
            Err(LoggerError::other("simulated failure"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingSink;

    impl Sink for PanickingSink {
        fn write(&mut self, _record: &Record) -> Result<()> {
            panic!("sink exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_format_line_layout() {
        let record = Record::new(LogLevel::Warning, "[main.rs:7] disk low".to_string());
        let mut buf = String::new();
        format_line(&record, &record.level, &mut buf);

        assert!(buf.starts_with('['));
        assert!(buf.contains(&format!("] [WARNING] [{}] [main.rs:7] disk low", record.thread_id)));
        assert!(!buf.ends_with('\n'));
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut set = SinkSet::new()
            .with_sink(FailingSink)
            .with_sink(PanickingSink)
            .with_sink(CollectingSink { lines: Arc::clone(&lines) });

        let ok = set.write(&Record::new(LogLevel::Error, "still delivered".to_string()));

        assert!(!ok);
        assert_eq!(lines.lock().as_slice(), ["still delivered"]);
        assert_eq!(set.names(), ["failing", "panicking", "collecting"]);
    }
}
