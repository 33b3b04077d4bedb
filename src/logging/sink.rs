// Output sinks and the swappable sink handle shared by the facade and the
// drain task

use super::report::ErrorReporter;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors raised by sinks
///
/// None of these are fatal: the handle reports them on the error channel and
/// carries on.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("cannot open log file \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush {target}: {source}")]
    Flush {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// Output sink for drained records
pub trait LogSink: Send {
    /// Append one record followed by a line terminator
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&mut self) -> io::Result<()>;

    /// Short name used in error reports
    fn name(&self) -> String;
}

/// Standard output sink (the fallback when no destination is configured)
pub struct StdoutSink {
    stdout: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stdout.lock(), "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn name(&self) -> String {
        "stdout".to_string()
    }
}

/// Append-mode file sink
pub struct FileSink {
    path: PathBuf,
    out: BufWriter<File>,
}

impl FileSink {
    /// Open (or create) `path` for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            out: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn name(&self) -> String {
        self.path().display().to_string()
    }
}

/// Where drained records should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// No destination: records fall back to standard output
    Stdout,
    /// Append to this file
    File(PathBuf),
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        if path.is_empty() {
            Target::Stdout
        } else {
            Target::File(PathBuf::from(path))
        }
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Target::from(path.as_str())
    }
}

impl From<&Path> for Target {
    fn from(path: &Path) -> Self {
        if path.as_os_str().is_empty() {
            Target::Stdout
        } else {
            Target::File(path.to_path_buf())
        }
    }
}

impl From<PathBuf> for Target {
    fn from(path: PathBuf) -> Self {
        Target::from(path.as_path())
    }
}

impl<T: Into<Target>> From<Option<T>> for Target {
    fn from(path: Option<T>) -> Self {
        path.map_or(Target::Stdout, Into::into)
    }
}

/// A configured destination
///
/// Flushed exactly once when the last reference goes away; the sink itself
/// (and with it the file) is closed right after.
struct ActiveSink {
    sink: Mutex<Box<dyn LogSink>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ActiveSink {
    fn with_sink<R>(&self, f: impl FnOnce(&mut dyn LogSink) -> R) -> R {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        f(sink.as_mut())
    }
}

impl Drop for ActiveSink {
    fn drop(&mut self) {
        let sink = self
            .sink
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(source) = sink.flush() {
            let err = SinkError::Flush {
                target: sink.name(),
                source,
            };
            self.reporter.report(&err.to_string());
        }
    }
}

/// Thread-safe, swappable handle to the current destination
///
/// Swapping takes a mutex (rare, not latency critical). Writers clone the
/// current `Arc` under that mutex and write outside it, so a swap racing with
/// a drain never tears a line; the replaced destination is flushed and closed
/// once the in-flight writer lets go of it.
pub struct SinkHandle {
    current: Mutex<Option<Arc<ActiveSink>>>,
    fallback: Mutex<Box<dyn LogSink>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SinkHandle {
    /// Handle with no destination, falling back to standard output
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self::with_fallback(Box::new(StdoutSink::new()), reporter)
    }

    /// Handle with a custom fallback sink
    pub fn with_fallback(fallback: Box<dyn LogSink>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            current: Mutex::new(None),
            fallback: Mutex::new(fallback),
            reporter,
        }
    }

    /// Point the handle at a new destination
    ///
    /// [`Target::Stdout`] clears the current destination. If a file cannot be
    /// opened the previous destination stays in place and the error is
    /// reported (and returned for callers that care).
    pub fn set(&self, target: impl Into<Target>) -> Result<(), SinkError> {
        match target.into() {
            Target::Stdout => {
                self.clear();
                Ok(())
            }
            Target::File(path) => match FileSink::open(&path) {
                Ok(sink) => {
                    self.set_sink(Box::new(sink));
                    Ok(())
                }
                Err(err) => {
                    self.reporter.report(&err.to_string());
                    Err(err)
                }
            },
        }
    }

    /// Install an already constructed sink as the destination
    pub fn set_sink(&self, sink: Box<dyn LogSink>) {
        let active = Arc::new(ActiveSink {
            sink: Mutex::new(sink),
            reporter: Arc::clone(&self.reporter),
        });
        let previous = self.lock_current().replace(active);
        // Flush+close happens here (or in the writer still holding it),
        // outside the swap lock.
        drop(previous);
    }

    /// Drop the current destination; later writes go to the fallback
    pub fn clear(&self) {
        let previous = self.lock_current().take();
        drop(previous);
    }

    /// True when a destination other than the fallback is configured
    pub fn has_destination(&self) -> bool {
        self.lock_current().is_some()
    }

    /// Write one line, never failing past this call
    ///
    /// I/O errors (and panics from custom sinks) are reported and swallowed.
    /// A line that cannot be written to the destination is written to the
    /// fallback instead.
    pub fn write(&self, line: &str) {
        let current = self.lock_current().clone();
        if let Some(active) = current {
            let written = self.contain(|| {
                active.with_sink(|sink| {
                    sink.write_line(line).map_err(|source| SinkError::Write {
                        target: sink.name(),
                        source,
                    })
                })
            });
            match written {
                Some(Ok(())) => return,
                Some(Err(err)) => self.reporter.report(&err.to_string()),
                // Panic already reported
                None => {}
            }
        }

        let _ = self.contain(|| {
            let mut fallback = self.lock_fallback();
            if let Err(source) = fallback.write_line(line) {
                let err = SinkError::Write {
                    target: fallback.name(),
                    source,
                };
                self.reporter.report(&err.to_string());
            }
        });
    }

    /// Flush the destination and the fallback, reporting failures
    pub fn flush(&self) {
        let current = self.lock_current().clone();
        if let Some(active) = current {
            let _ = self.contain(|| {
                active.with_sink(|sink| {
                    if let Err(source) = sink.flush() {
                        let err = SinkError::Flush {
                            target: sink.name(),
                            source,
                        };
                        self.reporter.report(&err.to_string());
                    }
                })
            });
        }

        let _ = self.contain(|| {
            let mut fallback = self.lock_fallback();
            if let Err(source) = fallback.flush() {
                let err = SinkError::Flush {
                    target: fallback.name(),
                    source,
                };
                self.reporter.report(&err.to_string());
            }
        });
    }

    fn contain<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                self.reporter.report(&format!(
                    "sink panicked while writing: {}",
                    panic_message(payload.as_ref())
                ));
                None
            }
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Arc<ActiveSink>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_fallback(&self) -> std::sync::MutexGuard<'_, Box<dyn LogSink>> {
        self.fallback.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
