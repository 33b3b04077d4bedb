// Lock-free asynchronous logging engine
//
// Producers -> Logger::log (filter + format) -> DrainStack::push (lock-free)
// -> [drain thread] take_all -> chronological order -> SinkHandle::write

mod consumer;
pub mod entry;
mod lifecycle;
mod logger;
#[macro_use]
mod macros;
mod report;
mod severity;
mod sink;
mod stack;

// Public exports
pub use consumer::DrainStats;
pub use entry::{format_record, timestamp};
pub use lifecycle::LifecycleError;
pub use logger::Logger;
pub use report::{ErrorReporter, JsonStderrReporter, StderrReporter};
pub use severity::Severity;
pub use sink::{FileSink, LogSink, SinkError, SinkHandle, StdoutSink, Target};
pub use stack::{Chain, Chronological, DrainStack};
