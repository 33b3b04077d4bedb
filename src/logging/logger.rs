// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logger facade: validation, severity filtering and enqueueing

use super::consumer::{DrainShared, DrainStats};
use super::entry::format_record;
use super::lifecycle::{LifecycleController, LifecycleError};
use super::report::{ErrorReporter, StderrReporter};
use super::sink::{LogSink, SinkError, SinkHandle, Target};
use super::Severity;
use crate::config::{ConfigError, LoggerConfig};
use std::sync::Arc;

/// Asynchronous, non-blocking logger
///
/// Producers call [`Logger::log`] from any number of threads; the call
/// formats the record and pushes it onto a lock-free stack without touching
/// I/O. A single background task drains the stack every `drain_interval` and
/// writes the records, oldest first, to the current destination.
///
/// There is no backpressure: if the destination cannot keep up, records
/// accumulate in memory until the next drain.
///
/// Dropping the logger stops the drain task, which performs its final drain.
///
/// # Example
/// ```no_run
/// use drainlog::{Logger, LoggerConfig, Severity};
/// use std::time::Duration;
///
/// let logger = Logger::new(LoggerConfig::new(Severity::Debug, Duration::from_secs(1)));
/// let _ = logger.set_destination("app.log");
/// logger.start().expect("drain thread");
/// logger.debug("A");
/// logger.debug("B");
/// logger.stop();
/// ```
pub struct Logger {
    config: LoggerConfig,
    shared: Arc<DrainShared>,
    lifecycle: LifecycleController,
}

impl Logger {
    /// Create a logger that reports errors on stderr and falls back to stdout
    pub fn new(config: LoggerConfig) -> Self {
        Self::with_reporter(config, Arc::new(StderrReporter))
    }

    /// Create a logger falling back to stdout with a custom error channel
    pub fn with_reporter(config: LoggerConfig, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self::from_sink(config, SinkHandle::new(Arc::clone(&reporter)), reporter)
    }

    /// Create a logger from untyped construction parameters
    ///
    /// Fails when `severity` is not a defined level or `interval_ms` is
    /// negative; no logger is produced in that case.
    pub fn from_raw(interval_ms: i64, severity: i64) -> Result<Self, ConfigError> {
        LoggerConfig::from_raw(interval_ms, severity).map(Self::new)
    }

    /// Create a logger with an explicit fallback sink and error channel
    pub fn with_parts(
        config: LoggerConfig,
        fallback: Box<dyn LogSink>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let sink = SinkHandle::with_fallback(fallback, Arc::clone(&reporter));
        Self::from_sink(config, sink, reporter)
    }

    fn from_sink(config: LoggerConfig, sink: SinkHandle, reporter: Arc<dyn ErrorReporter>) -> Self {
        let shared = Arc::new(DrainShared::new(sink, reporter));
        let lifecycle = LifecycleController::new(Arc::clone(&shared), config.drain_interval());
        Self {
            config,
            shared,
            lifecycle,
        }
    }

    /// Check if a record of this severity would be kept
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.config.min_severity()
    }

    /// Enqueue a record (never blocks on I/O, never fails)
    ///
    /// Empty messages are rejected on the error channel. Records below the
    /// configured threshold are silently dropped.
    pub fn log(&self, severity: Severity, message: &str) {
        if message.is_empty() {
            self.shared.reporter.report(&format!(
                "invalid parameters for log: {}; empty message",
                severity
            ));
            return;
        }

        if !self.enabled(severity) {
            return;
        }

        self.shared.stack.push(format_record(severity, message));
    }

    /// Enqueue a record whose severity arrives as an untyped level
    pub fn log_raw(&self, level: i64, message: &str) {
        match Severity::from_level(level) {
            Some(severity) => self.log(severity, message),
            None => self.shared.reporter.report(&format!(
                "invalid parameters for log: {}; {}",
                level, message
            )),
        }
    }

    #[inline]
    pub fn trace(&self, message: &str) {
        self.log(Severity::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    #[inline]
    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    /// Switch the destination; an empty path means stdout
    ///
    /// A file that cannot be opened leaves the previous destination in place;
    /// the failure is reported on the error channel and returned.
    pub fn set_destination(&self, target: impl Into<Target>) -> Result<(), SinkError> {
        self.shared.sink.set(target)
    }

    /// Install a custom sink as the destination
    pub fn set_sink(&self, sink: Box<dyn LogSink>) {
        self.shared.sink.set_sink(sink);
    }

    /// Start the background drain task (idempotent)
    pub fn start(&self) -> Result<(), LifecycleError> {
        self.lifecycle.start()
    }

    /// Stop the drain task after a final drain and clear the destination
    /// (idempotent)
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    /// Stop, point at a new destination, and start a fresh drain task
    pub fn restart_with(&self, target: impl Into<Target>) -> Result<(), LifecycleError> {
        self.stop();
        // An unopenable file is already reported; records go to stdout then
        let _ = self.set_destination(target);
        self.start()
    }

    /// Stop and start again without configuring a destination in between
    pub fn restart(&self) -> Result<(), LifecycleError> {
        self.stop();
        self.start()
    }

    /// Drain synchronously on the calling thread
    ///
    /// Returns the number of records written. Serialized with the background
    /// task, so ordering is preserved.
    pub fn flush(&self) -> usize {
        self.shared.drain_once()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn tasks_spawned(&self) -> u64 {
        self.lifecycle.tasks_spawned()
    }

    pub fn stats(&self) -> DrainStats {
        self.shared.stats()
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }
}
