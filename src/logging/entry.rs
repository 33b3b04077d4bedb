// SPDX-License-Identifier: Apache-2.0 OR MIT
// Record formatting: "<timestamp> <Severity>: <message>"

use super::Severity;

/// Fixed-width, second-resolution local timestamp format
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Current local time rendered with [`TIMESTAMP_FORMAT`]
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Build the immutable text of one record
///
/// The returned string is what gets enqueued; nothing downstream looks inside
/// it again.
pub fn format_record(severity: Severity, message: &str) -> String {
    format_record_at(&timestamp(), severity, message)
}

pub(crate) fn format_record_at(timestamp: &str, severity: Severity, message: &str) -> String {
    let mut record =
        String::with_capacity(timestamp.len() + severity.as_str().len() + message.len() + 3);
    record.push_str(timestamp);
    record.push(' ');
    record.push_str(severity.as_str());
    record.push_str(": ");
    record.push_str(message);
    record
}
