//! # twoway
//!
//! Two-way factorial analysis of a numeric outcome measured on subjects under
//! several conditions at several times, with optional repeated measures.
//!
//! A run screens every (condition, time) cell for outliers, checks normality
//! and homogeneity of variance, fits the two-way ANOVA and compares conditions
//! pairwise within each time with a Tukey adjustment across the whole family.
//! Assumption checks are advisory: they are reported next to the results and
//! never stop the analysis.
//!
//! The statistics live in [`twoway_core`]; this crate adds CSV ingestion,
//! configuration, the pipeline driver, the aggregated [`Report`] and output
//! in JSON, CSV and plain text. Progress and assumption warnings are emitted
//! through `tracing`; install a subscriber to see them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use twoway::{analyze_file, output, PipelineConfig};
//!
//! let config = PipelineConfig::new().with_repeated_measures(true);
//! let report = analyze_file("glucose.csv", &config)?;
//!
//! println!("{}", output::format_report(&report));
//! for note in report.assumption_violations(config.alpha) {
//!     eprintln!("note: {}", note);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
mod error;
pub mod output;
mod pipeline;
mod report;

pub use config::{ColumnSchema, ConfigError, OutlierPolicy, PipelineConfig};
pub use data::{load_long_csv, read_long_csv, DataError};
pub use error::{Error, Result};
pub use pipeline::{analyze_file, run};
pub use report::{AssumptionViolation, Report};

// Re-export the core crate for access to result types and engines
pub use twoway_core;
pub use twoway_core::{
    AnalysisError, AnovaMode, AnovaResult, Dataset, Design, ErrorTermSource, Factor, Observation,
    PostHocResult, SchemaError, Source, SphericityCorrection,
};
