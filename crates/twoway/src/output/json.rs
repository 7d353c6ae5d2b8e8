//! JSON serialization for analysis reports.
//!
//! Non-finite numbers (an undefined p-value, an infinite F) are written as
//! `null`. Reading a report back turns them into NaN, or `None` for optional
//! statistics.

use crate::report::Report;

/// Serialize a Report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Report).
pub fn to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a Report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Report).
pub fn to_json_pretty(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Read a Report back from JSON written by [`to_json`] or [`to_json_pretty`].
///
/// # Errors
///
/// Returns an error if the text is not a serialized Report.
pub fn from_json(json: &str) -> Result<Report, serde_json::Error> {
    serde_json::from_str(json)
}
