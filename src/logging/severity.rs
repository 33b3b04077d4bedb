// Severity levels for logging

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log severity levels, ordered by increasing importance
///
/// A record is kept when its severity is greater than or equal to the
/// logger's configured threshold.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Very fine-grained tracing
    Trace = 0,
    /// Diagnostic detail useful while debugging
    Debug = 1,
    /// Normal operational messages
    Info = 2,
    /// Error conditions
    Error = 3,
}

impl Severity {
    /// All severities, least important first
    pub const ALL: [Severity; 4] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Error,
    ];

    /// Get severity level as u8 (0-3)
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get severity name as it appears in a formatted record
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "Trace",
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Error => "Error",
        }
    }

    /// Create from u8 value (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Trace),
            1 => Some(Severity::Debug),
            2 => Some(Severity::Info),
            3 => Some(Severity::Error),
            _ => None,
        }
    }

    /// Create from an untyped level, rejecting anything out of range
    pub fn from_level(level: i64) -> Option<Self> {
        u8::try_from(level).ok().and_then(Self::from_u8)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}
