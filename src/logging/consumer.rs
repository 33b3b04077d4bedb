// Drain task - periodically empties the stack and writes records in order

use super::report::ErrorReporter;
use super::sink::{panic_message, SinkHandle};
use super::stack::DrainStack;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Counters describing drain activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainStats {
    /// Records handed to the sink
    pub records_written: u64,
    /// Drains that found at least one record
    pub drains: u64,
    /// Failed CAS attempts by producers (contention)
    pub cas_retries: u64,
}

/// State shared between producers, the facade and the drain task
pub struct DrainShared {
    pub(crate) stack: DrainStack<String>,
    pub(crate) sink: SinkHandle,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    shutdown: AtomicBool,
    task_alive: AtomicBool,
    /// Held for the whole take + write of a snapshot: one consumer at a time
    consumer: Mutex<()>,
    records_written: AtomicU64,
    drains: AtomicU64,
    #[cfg(test)]
    pub(crate) inject_panic: AtomicBool,
}

impl DrainShared {
    pub fn new(sink: SinkHandle, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            stack: DrainStack::new(),
            sink,
            reporter,
            shutdown: AtomicBool::new(false),
            task_alive: AtomicBool::new(false),
            consumer: Mutex::new(()),
            records_written: AtomicU64::new(0),
            drains: AtomicU64::new(0),
            #[cfg(test)]
            inject_panic: AtomicBool::new(false),
        }
    }

    /// Take everything queued and write it oldest first
    ///
    /// Returns the number of records written. Safe to call from any thread;
    /// concurrent callers are serialized so snapshots reach the sink in the
    /// order they were taken.
    pub fn drain_once(&self) -> usize {
        let _consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner);

        #[cfg(test)]
        if self.inject_panic.swap(false, Ordering::SeqCst) {
            panic!("injected drain failure");
        }

        let chain = self.stack.take_all();
        if chain.is_empty() {
            return 0;
        }

        let mut written = 0;
        for record in chain {
            self.sink.write(&record);
            written += 1;
        }
        self.sink.flush();

        self.records_written
            .fetch_add(written as u64, Ordering::Relaxed);
        self.drains.fetch_add(1, Ordering::Relaxed);
        written
    }

    pub fn stats(&self) -> DrainStats {
        DrainStats {
            records_written: self.records_written.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            cas_retries: self.stack.cas_retries(),
        }
    }

    pub(crate) fn request_shutdown(&self, shutdown: bool) {
        self.shutdown.store(shutdown, Ordering::SeqCst);
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub(crate) fn set_task_alive(&self, alive: bool) {
        self.task_alive.store(alive, Ordering::SeqCst);
    }

    pub(crate) fn task_alive(&self) -> bool {
        self.task_alive.load(Ordering::SeqCst)
    }
}

/// Periodic drain loop run on the background thread
///
/// Active: sleep for the interval, drain, re-check the shutdown flag.
/// Exiting: one last drain for whatever arrived since the previous one.
///
/// A panic anywhere in the loop is caught and reported; the task then ends
/// and stays down until `start()` is called again.
pub struct DrainScheduler {
    shared: Arc<DrainShared>,
    interval: Duration,
}

impl DrainScheduler {
    pub fn new(shared: Arc<DrainShared>, interval: Duration) -> Self {
        Self { shared, interval }
    }

    /// Run until shutdown is requested (blocks the calling thread)
    pub fn run(self) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            while !self.shared.shutdown_requested() {
                self.sleep_interval();
                self.shared.drain_once();
            }
            self.shared.drain_once();
        }));

        if let Err(payload) = result {
            self.shared.reporter.report(&format!(
                "unexpected error in background drain task: {}",
                panic_message(payload.as_ref())
            ));
        }
        self.shared.set_task_alive(false);
    }

    /// Sleep for one interval; `stop()` unparks us to cut it short
    fn sleep_interval(&self) {
        let Some(deadline) = Instant::now().checked_add(self.interval) else {
            // Interval past the clock's range: only shutdown wakes us
            while !self.shared.shutdown_requested() {
                thread::park();
            }
            return;
        };
        while !self.shared.shutdown_requested() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
