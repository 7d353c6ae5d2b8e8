//! Output formatting for reports.
//!
//! - [`json`]: the whole report as JSON
//! - [`csv`]: any flat [`Table`](twoway_core::Table) as CSV
//! - [`terminal`]: human-readable sections with colored significance markers

pub mod csv;
pub mod json;
pub mod terminal;

pub use self::csv::{write_csv, write_csv_file};
pub use json::{from_json, to_json, to_json_pretty};
pub use terminal::format_report;
