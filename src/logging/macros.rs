// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros for convenient logging
//
// Each macro checks the threshold before formatting, so filtered records cost
// a comparison and nothing else.

/// Log a formatted message at an explicit severity
///
/// # Examples
/// ```ignore
/// log_at!(logger, Severity::Info, "worker #{} started", id);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let severity = $severity;
        if logger.enabled(severity) {
            logger.log(severity, &format!($($arg)+));
        }
    }};
}

/// Log a message with trace severity
///
/// # Examples
/// ```ignore
/// log_trace!(logger, "entering poll loop");
/// ```
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Trace, $($arg)+)
    };
}

/// Log a message with debug severity
///
/// # Examples
/// ```ignore
/// log_debug!(logger, "iteration {}", i);
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Debug, $($arg)+)
    };
}

/// Log a message with info severity
///
/// # Examples
/// ```ignore
/// log_info!(logger, "worker #{} is exiting", id);
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Info, $($arg)+)
    };
}

/// Log a message with error severity
///
/// # Examples
/// ```ignore
/// log_error!(logger, "failed to open {}", path.display());
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Error, $($arg)+)
    };
}
