//! Property-based tests for xyz_log using proptest

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use xyz_log::prelude::*;
use xyz_log::{Backend, DeliveryEngine, DeliveryMode, Record, Sink, SinkSet};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

/// Sink that keeps every message it is given
struct CollectingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Sink for CollectingSink {
    fn write(&mut self, record: &Record) -> xyz_log::Result<()> {
        self.messages.lock().push(record.message.clone());
        Ok(())
    }

    fn flush(&mut self) -> xyz_log::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Names parse back to the same level in any letter case
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower { level.to_str().to_lowercase() } else { level.to_str().to_string() };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Level ordering agrees with the numeric encoding
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.as_u8() <= b.as_u8());
        prop_assert_eq!(a.cmp(&b), a.as_u8().cmp(&b.as_u8()));
        prop_assert_eq!(LogLevel::from_u8(a.as_u8()), a);
    }

    /// Unknown names never parse
    #[test]
    fn test_unknown_level_names_rejected(name in "[a-z]{1,12}") {
        let known = ["trace", "debug", "info", "warn", "warning", "error", "fatal"];
        prop_assume!(!known.contains(&name.as_str()));
        prop_assert!(name.parse::<LogLevel>().is_err());
    }
}

// ============================================================================
// Backend Tests
// ============================================================================

proptest! {
    /// The crash backend never filters below INFO and leaves the rest alone
    #[test]
    fn test_crash_backend_level_collapse(level in any_level()) {
        let effective = Backend::CrashCapture.effective_level(level);
        prop_assert!(effective >= LogLevel::Info);
        if level >= LogLevel::Info {
            prop_assert_eq!(effective, level);
        }
        prop_assert_eq!(Backend::Pipeline.effective_level(level), level);
    }

    /// Crash backend rotation works on whole MiB, never below one
    #[test]
    fn test_crash_backend_rotation_size(bytes in 1u64..(64 * 1024 * 1024)) {
        const MIB: u64 = 1024 * 1024;
        let options = LoggerOptions::new("p")
            .with_backend(Backend::CrashCapture)
            .with_max_log_size(bytes);
        let effective = options.effective_max_log_size();

        prop_assert_eq!(effective % MIB, 0);
        prop_assert!(effective >= MIB);
        prop_assert!(effective <= bytes.max(MIB));

        let pipeline = LoggerOptions::new("p").with_max_log_size(bytes);
        prop_assert_eq!(pipeline.effective_max_log_size(), bytes);
    }

    /// Program names with separators are always rejected
    #[test]
    fn test_program_name_validation(
        head in "[a-z]{0,6}",
        sep in prop::sample::select(vec!['/', '\\']),
        tail in "[a-z]{0,6}",
    ) {
        let options = LoggerOptions::new(format!("{}{}{}", head, sep, tail));
        prop_assert!(options.validate().is_err());

        let joined = format!("{}{}", head, tail);
        if !joined.is_empty() {
            prop_assert!(LoggerOptions::new(joined).validate().is_ok());
        }
    }
}

// ============================================================================
// Record Builder Tests
// ============================================================================

proptest! {
    /// The builder text is the call-site prefix followed by the appended values
    #[test]
    fn test_builder_concatenates_values(
        text in "[ -~]{0,40}",
        number in any::<i64>(),
        line in 1u32..10_000,
    ) {
        // No session in this binary: every level is enabled
        let builder = RecordBuilder::new("src/some/module.rs", line, LogLevel::Info) << text.as_str() << number;
        prop_assert_eq!(builder.as_str(), format!("[module.rs:{}] {}{}", line, text, number));
        builder.discard();
    }
}

// ============================================================================
// Delivery Engine Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever the queue capacity, a single producer's records arrive
    /// complete and in order
    #[test]
    fn test_async_delivery_preserves_order(capacity in 1usize..16, count in 0usize..200) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sinks = SinkSet::new().with_sink(CollectingSink { messages: Arc::clone(&messages) });
        let mut engine = DeliveryEngine::start(sinks, DeliveryMode::Async { capacity }).unwrap();

        for i in 0..count {
            engine.submit(Record::new(LogLevel::Info, i.to_string())).unwrap();
        }
        engine.shutdown();

        let expected: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        prop_assert_eq!(&*messages.lock(), &expected);
        prop_assert_eq!(engine.metrics().delivered(), count as u64);
    }
}
