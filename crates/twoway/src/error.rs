//! Top-level error type.

use thiserror::Error;
use twoway_core::{AnalysisError, SchemaError};

use crate::config::ConfigError;
use crate::data::DataError;

/// Any failure that aborts a pipeline run.
///
/// Assumption-check problems are never errors; they are reported in the
/// [`Report`](crate::Report).
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The input could not be loaded.
    #[error(transparent)]
    Data(#[from] DataError),

    /// An analysis stage failed on structurally invalid data.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Error::Analysis(AnalysisError::Schema(e))
    }
}

/// Result alias for pipeline operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
