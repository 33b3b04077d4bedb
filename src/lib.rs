//! Lock-free asynchronous logger.
//!
//! Producer threads record messages in near-constant time without blocking on
//! I/O; a single background thread periodically writes the accumulated
//! records to a file (or standard output) in their original order.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigFile, LoggerConfig};
pub use logging::{Logger, Severity, Target};
