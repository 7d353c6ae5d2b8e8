//! Loading long-format data tables.
//!
//! The input is one row per observation with four columns: subject
//! identifier, condition label, time label and numeric outcome. Column names
//! come from a [`ColumnSchema`](crate::config::ColumnSchema).
//!
//! # Example
//!
//! ```ignore
//! use twoway::config::ColumnSchema;
//! use twoway::data::load_long_csv;
//!
//! let dataset = load_long_csv("glucose.csv", &ColumnSchema::default())?;
//! println!("{} observations in {} cells", dataset.len(), dataset.n_cells());
//! ```

mod csv;

pub use self::csv::{load_long_csv, read_long_csv};

use thiserror::Error;
use twoway_core::SchemaError;

/// Errors that can occur during data loading.
#[derive(Debug, Error)]
pub enum DataError {
    /// The file could not be opened or read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV itself is malformed (ragged rows, bad quoting, invalid UTF-8).
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// The table does not describe a valid dataset.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
