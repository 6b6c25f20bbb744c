//! Delivery metrics for observability
//!
//! Counters describing how records moved through the delivery engine,
//! including back-pressure events on the bounded queue.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the delivery engine
///
/// # Example
///
/// ```
/// use xyz_log::DeliveryMetrics;
///
/// let metrics = DeliveryMetrics::new();
/// metrics.record_submitted();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct DeliveryMetrics {
    /// Records accepted by `submit`
    submitted: AtomicU64,

    /// Records written to every sink without error
    delivered: AtomicU64,

    /// Records for which at least one sink failed
    write_failures: AtomicU64,

    /// Times a producer found the queue full and had to wait
    queue_full_events: AtomicU64,
}

impl DeliveryMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    /// Records submitted but not yet processed by the sinks
    pub fn pending(&self) -> u64 {
        self.submitted()
            .saturating_sub(self.delivered() + self.write_failures())
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DeliveryMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            delivered: AtomicU64::new(self.delivered()),
            write_failures: AtomicU64::new(self.write_failures()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = DeliveryMetrics::new();
        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.write_failures(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
    }

    #[test]
    fn test_pending() {
        let metrics = DeliveryMetrics::new();
        for _ in 0..5 {
            metrics.record_submitted();
        }
        metrics.record_delivered();
        metrics.record_write_failure();
        assert_eq!(metrics.pending(), 3);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = DeliveryMetrics::new();
        metrics.record_submitted();

        let snapshot = metrics.clone();
        metrics.record_submitted();

        assert_eq!(snapshot.submitted(), 1);
        assert_eq!(metrics.submitted(), 2);
    }
}
