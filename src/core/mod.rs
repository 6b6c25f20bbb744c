//! Core logger types and traits

pub mod crash;
pub mod engine;
pub mod error;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod options;
pub mod record;
pub mod record_builder;
pub mod sink;
pub mod timestamp;

pub use engine::{DeliveryEngine, DeliveryMode};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use logger::{Logger, DEFAULT_LOG_LEVEL, FATAL_FLUSH_TIMEOUT, FATAL_GRACE_PERIOD};
pub use metrics::DeliveryMetrics;
pub use options::{Backend, LoggerOptions, DEFAULT_MAX_LOG_SIZE, DEFAULT_PROGRAM_NAME, DEFAULT_QUEUE_CAPACITY};
pub use record::Record;
pub use record_builder::RecordBuilder;
pub use sink::{format_line, Sink, SinkSet};
pub use timestamp::TimestampFormat;
