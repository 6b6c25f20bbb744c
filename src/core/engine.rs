//! Delivery engine
//!
//! Owns the sink set and moves finished records into it, either directly on
//! the calling thread (synchronous mode) or through a bounded queue drained
//! by a single background worker (asynchronous mode).
//!
//! In asynchronous mode a full queue blocks the producer until the worker
//! makes room: records are never dropped. The single consumer serializes
//! records from every producer, so sinks observe exactly the submission order.

use super::{
    error::{LoggerError, Result},
    metrics::DeliveryMetrics,
    record::Record,
    sink::SinkSet,
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Maximum number of queued commands the worker drains per wake-up
const BATCH_SIZE: usize = 64;

/// How records reach the sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Write on the calling thread.
    ///
    /// With `multi_thread` off the caller promises a single producer; the
    /// engine reports the first violated promise on stderr instead of racing.
    Sync { multi_thread: bool },
    /// Queue up to `capacity` records for a background worker.
    Async { capacity: usize },
}

enum Command {
    Record(Record),
    /// Flush barrier: acknowledged once everything queued before it is
    /// written and the sinks are flushed.
    Flush(Sender<()>),
}

enum Inner {
    Sync {
        sinks: Mutex<SinkSet>,
        multi_thread: bool,
        contention_reported: AtomicBool,
        stopped: bool,
    },
    Async {
        sender: Option<Sender<Command>>,
        worker: Option<thread::JoinHandle<()>>,
        capacity: usize,
    },
}

pub struct DeliveryEngine {
    inner: Inner,
    metrics: Arc<DeliveryMetrics>,
}

impl DeliveryEngine {
    /// Start delivering into `sinks`.
    ///
    /// # Errors
    ///
    /// Returns an error if the async capacity is zero or the worker thread
    /// cannot be spawned.
    pub fn start(sinks: SinkSet, mode: DeliveryMode) -> Result<Self> {
        let metrics = Arc::new(DeliveryMetrics::new());

        let inner = match mode {
            DeliveryMode::Sync { multi_thread } => Inner::Sync {
                sinks: Mutex::new(sinks),
                multi_thread,
                contention_reported: AtomicBool::new(false),
                stopped: false,
            },
            DeliveryMode::Async { capacity } => {
                if capacity == 0 {
                    return Err(LoggerError::config(
                        "DeliveryEngine",
                        "async queue capacity must be positive",
                    ));
                }
                let (sender, receiver) = bounded(capacity);
                let worker_metrics = Arc::clone(&metrics);
                let worker = thread::Builder::new()
                    .name("xyz-log-worker".to_string())
                    .spawn(move || run_worker(receiver, sinks, worker_metrics))
                    .map_err(LoggerError::WorkerSpawn)?;

                Inner::Async {
                    sender: Some(sender),
                    worker: Some(worker),
                    capacity,
                }
            }
        };

        Ok(Self { inner, metrics })
    }

    pub fn mode(&self) -> DeliveryMode {
        match &self.inner {
            Inner::Sync { multi_thread, .. } => DeliveryMode::Sync {
                multi_thread: *multi_thread,
            },
            Inner::Async { capacity, .. } => DeliveryMode::Async {
                capacity: *capacity,
            },
        }
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        match &self.inner {
            Inner::Sync { stopped, .. } => !stopped,
            Inner::Async { sender, .. } => sender.is_some(),
        }
    }

    /// Hand a record to the sinks.
    ///
    /// Synchronous mode returns after the write. Asynchronous mode returns
    /// once the record is queued, blocking while the queue is full.
    pub fn submit(&self, record: Record) -> Result<()> {
        match &self.inner {
            Inner::Sync {
                sinks,
                multi_thread,
                contention_reported,
                stopped,
            } => {
                if *stopped {
                    return Err(LoggerError::LoggerStopped);
                }
                self.metrics.record_submitted();
                let mut sinks = lock_sinks(sinks, *multi_thread, contention_reported);
                if sinks.write(&record) {
                    self.metrics.record_delivered();
                } else {
                    self.metrics.record_write_failure();
                }
                Ok(())
            }
            Inner::Async { sender, .. } => {
                let sender = sender.as_ref().ok_or(LoggerError::LoggerStopped)?;
                match sender.try_send(Command::Record(record)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(command)) => {
                        // Back-pressure: wait for the worker instead of dropping
                        self.metrics.record_queue_full();
                        sender
                            .send(command)
                            .map_err(|_| LoggerError::ChannelSendError)?;
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        return Err(LoggerError::ChannelSendError);
                    }
                }
                self.metrics.record_submitted();
                Ok(())
            }
        }
    }

    /// Flush every sink, waiting for the worker to write everything queued
    /// before this call.
    pub fn flush(&self) -> Result<()> {
        match self.flush_within(None)? {
            true => Ok(()),
            false => Err(LoggerError::other("flush did not complete")),
        }
    }

    /// Like [`flush`](Self::flush) but gives up waiting on the worker after
    /// `timeout`. Returns whether the flush was confirmed.
    pub fn flush_timeout(&self, timeout: Duration) -> Result<bool> {
        self.flush_within(Some(timeout))
    }

    fn flush_within(&self, timeout: Option<Duration>) -> Result<bool> {
        match &self.inner {
            Inner::Sync {
                sinks,
                multi_thread,
                contention_reported,
                stopped,
            } => {
                if *stopped {
                    return Ok(true);
                }
                Ok(lock_sinks(sinks, *multi_thread, contention_reported).flush())
            }
            Inner::Async { sender, .. } => {
                let Some(sender) = sender.as_ref() else {
                    // Shutdown already drained and flushed everything
                    return Ok(true);
                };
                let (ack_tx, ack_rx) = bounded(1);
                let Some(timeout) = timeout else {
                    sender
                        .send(Command::Flush(ack_tx))
                        .map_err(|_| LoggerError::ChannelSendError)?;
                    return Ok(ack_rx.recv().is_ok());
                };

                // The deadline covers enqueueing the barrier as well as the ack
                let deadline = Instant::now() + timeout;
                match sender.send_timeout(Command::Flush(ack_tx), timeout) {
                    Ok(()) => {}
                    Err(SendTimeoutError::Timeout(_)) => return Ok(false),
                    Err(SendTimeoutError::Disconnected(_)) => {
                        return Err(LoggerError::ChannelSendError)
                    }
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                Ok(ack_rx.recv_timeout(remaining).is_ok())
            }
        }
    }

    /// Drain pending records, flush and close the sinks, and stop the worker.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn shutdown(&mut self) {
        match &mut self.inner {
            Inner::Sync { sinks, stopped, .. } => {
                if *stopped {
                    return;
                }
                *stopped = true;
                let mut sinks = std::mem::take(&mut *sinks.lock());
                sinks.flush();
                // Dropping the set closes the files
            }
            Inner::Async { sender, worker, .. } => {
                // Closing the channel lets the worker drain what is queued and exit
                drop(sender.take());
                if let Some(handle) = worker.take() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Delivery worker panicked during shutdown: {:?}", e);
                    }
                }
            }
        }
    }
}

impl Drop for DeliveryEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock_sinks<'a>(
    sinks: &'a Mutex<SinkSet>,
    multi_thread: bool,
    contention_reported: &AtomicBool,
) -> MutexGuard<'a, SinkSet> {
    if multi_thread {
        return sinks.lock();
    }
    match sinks.try_lock() {
        Some(guard) => guard,
        None => {
            report_contention_once(contention_reported);
            sinks.lock()
        }
    }
}

/// Print the single-producer violation warning the first time only.
/// Returns whether this call printed it.
fn report_contention_once(reported: &AtomicBool) -> bool {
    if reported.swap(true, Ordering::Relaxed) {
        return false;
    }
    eprintln!(
        "[LOGGER WARNING] Concurrent write on a logger configured with multi_thread = false; \
         serializing. Further occurrences are not reported."
    );
    true
}

fn run_worker(receiver: Receiver<Command>, mut sinks: SinkSet, metrics: Arc<DeliveryMetrics>) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);

    loop {
        // recv only fails once the channel is closed and empty
        match receiver.recv() {
            Ok(command) => batch.push(command),
            Err(_) => break,
        }

        while batch.len() < BATCH_SIZE {
            match receiver.try_recv() {
                Ok(command) => batch.push(command),
                Err(_) => break,
            }
        }

        for command in batch.drain(..) {
            match command {
                Command::Record(record) => {
                    if sinks.write(&record) {
                        metrics.record_delivered();
                    } else {
                        metrics.record_write_failure();
                    }
                }
                Command::Flush(ack) => {
                    sinks.flush();
                    let _ = ack.send(());
                }
            }
        }

        sinks.flush();
    }

    sinks.flush();
}
