// SPDX-License-Identifier: Apache-2.0 OR MIT
// Operator error channel
//
// The engine never unwinds into producer threads. Anything that goes wrong
// (bad call arguments, I/O failures, a panicking drain task) is written here
// as one line and execution continues.

use std::io::Write;

/// Destination for one-line, human-readable error reports
pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Plain text reports on stderr (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter;

impl ErrorReporter for StderrReporter {
    fn report(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "drainlog: {}", message);
    }
}

/// JSON reports on stderr, one object per line
///
/// Useful when stderr is collected by a log shipper.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStderrReporter;

impl ErrorReporter for JsonStderrReporter {
    fn report(&self, message: &str) {
        let line = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "level": "error",
            "component": "drainlog",
            "message": message,
        });
        eprintln!("{}", line);
    }
}
