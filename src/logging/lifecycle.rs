//! Start/stop control for the background drain task
//!
//! At most one drain task exists at a time. Both transitions use a
//! double-checked pattern: a cheap atomic check on the fast path, then a
//! re-check under the worker mutex before spawning or joining.

use super::consumer::{DrainScheduler, DrainShared};
use super::sink::panic_message;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from lifecycle transitions
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("failed to spawn drain thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Owns the drain task handle and serializes start/stop
pub struct LifecycleController {
    shared: Arc<DrainShared>,
    interval: Duration,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    tasks_spawned: AtomicU64,
}

impl LifecycleController {
    pub fn new(shared: Arc<DrainShared>, interval: Duration) -> Self {
        Self {
            shared,
            interval,
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
            tasks_spawned: AtomicU64::new(0),
        }
    }

    /// Spawn the drain task unless one is already running
    ///
    /// A task that died from a contained panic is reaped and replaced; a live
    /// task makes this a no-op.
    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.is_running() {
            return Ok(());
        }

        let mut worker = self.lock_worker();
        if let Some(handle) = worker.as_ref() {
            if !handle.is_finished() {
                return Ok(());
            }
            if let Some(dead) = worker.take() {
                let _ = dead.join();
            }
        }

        self.shared.request_shutdown(false);
        self.shared.set_task_alive(true);

        let scheduler = DrainScheduler::new(Arc::clone(&self.shared), self.interval);
        let spawned = thread::Builder::new()
            .name("drainlog-drain".into())
            .spawn(move || scheduler.run());

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
                self.running.store(true, Ordering::Release);
                Ok(())
            }
            Err(err) => {
                self.shared.set_task_alive(false);
                self.running.store(false, Ordering::Release);
                let err = LifecycleError::Spawn(err);
                self.shared.reporter.report(&err.to_string());
                Err(err)
            }
        }
    }

    /// Stop the drain task after its final drain, then clear the destination
    ///
    /// No-op when nothing is running. Records pushed after the final drain
    /// stay queued until the next `start()` (or an explicit flush).
    pub fn stop(&self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }

        let mut worker = self.lock_worker();
        let Some(handle) = worker.take() else {
            return;
        };

        // Flag first, then wake, then join
        self.shared.request_shutdown(true);
        handle.thread().unpark();
        if let Err(payload) = handle.join() {
            self.shared.reporter.report(&format!(
                "drain task terminated abnormally: {}",
                panic_message(payload.as_ref())
            ));
        }

        self.running.store(false, Ordering::Release);
        self.shared.sink.clear();
    }

    /// Whether a live drain task exists right now
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && self.shared.task_alive()
    }

    /// Total number of drain tasks spawned over this controller's lifetime
    pub fn tasks_spawned(&self) -> u64 {
        self.tasks_spawned.load(Ordering::Relaxed)
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.stop();
    }
}
