// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger configuration and its JSON5 file format.
//!
//! ```json5
//! {
//!     // Trace | Debug | Info | Error (case-insensitive)
//!     min_severity: "debug",
//!     drain_interval_ms: 1000,
//!     // Empty or absent: standard output
//!     destination: "/var/log/app.log",
//! }
//! ```

use crate::logging::{Severity, Target};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Validated, immutable logger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    min_severity: Severity,
    drain_interval: Duration,
}

impl LoggerConfig {
    pub const DEFAULT_SEVERITY: Severity = Severity::Debug;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    pub const fn new(min_severity: Severity, drain_interval: Duration) -> Self {
        Self {
            min_severity,
            drain_interval,
        }
    }

    /// Validate untyped construction parameters
    pub fn from_raw(interval_ms: i64, severity: i64) -> Result<Self, ConfigError> {
        let min_severity =
            Severity::from_level(severity).ok_or(ConfigError::InvalidSeverity(severity))?;
        let interval_ms =
            u64::try_from(interval_ms).map_err(|_| ConfigError::NegativeInterval(interval_ms))?;
        Ok(Self::new(min_severity, Duration::from_millis(interval_ms)))
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    pub fn drain_interval(&self) -> Duration {
        self.drain_interval
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEVERITY, Self::DEFAULT_INTERVAL)
    }
}

/// Configuration as stored on disk (JSON5)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConfigFile {
    /// Severity name; defaults to Debug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<String>,

    /// Drain interval in milliseconds; defaults to 2000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_interval_ms: Option<i64>,

    /// Log file path; empty or absent means standard output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to a JSON5-compatible string
    pub fn to_json5(&self) -> String {
        // json5 has no pretty printer; JSON is valid JSON5
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json5())
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))
    }

    /// Check the values and build a [`LoggerConfig`]
    pub fn validate(&self) -> Result<LoggerConfig, ConfigError> {
        let min_severity = match &self.min_severity {
            Some(name) => name
                .parse::<Severity>()
                .map_err(|_| ConfigError::UnknownSeverity(name.clone()))?,
            None => LoggerConfig::DEFAULT_SEVERITY,
        };

        let drain_interval = match self.drain_interval_ms {
            Some(ms) => {
                let ms = u64::try_from(ms).map_err(|_| ConfigError::NegativeInterval(ms))?;
                Duration::from_millis(ms)
            }
            None => LoggerConfig::DEFAULT_INTERVAL,
        };

        Ok(LoggerConfig::new(min_severity, drain_interval))
    }

    /// Destination described by this file
    pub fn target(&self) -> Target {
        Target::from(self.destination.as_deref())
    }
}

/// Configuration errors
///
/// These are the only errors surfaced as hard failures, and only to the
/// thread constructing the logger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("log level is invalid: {0} (expected 0..=3)")]
    InvalidSeverity(i64),

    #[error("unknown severity '{0}' (expected Trace, Debug, Info or Error)")]
    UnknownSeverity(String),

    #[error("drain interval cannot be negative: {0} ms")]
    NegativeInterval(i64),

    #[error("failed to read config file '{path}': {1}", path = .0.display())]
    Io(PathBuf, String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}
