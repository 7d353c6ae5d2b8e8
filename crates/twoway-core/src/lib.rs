//! Core statistics for two-way factorial experiments.
//!
//! This crate implements the analysis sequence for a numeric outcome measured
//! on subjects under one of several conditions at several ordered time points:
//!
//! 1. **Outlier screen** ([`outliers`]): per-cell boxplot-rule classification
//! 2. **Normality** ([`normality`]): per-cell Shapiro-Wilk test
//! 3. **Homogeneity of variance** ([`homogeneity`]): Bartlett's test across cells
//! 4. **ANOVA** ([`anova`]): two-way factorial ANOVA, optionally stratified by subject
//! 5. **Post-hoc** ([`posthoc`]): Tukey-adjusted pairwise comparisons within each time
//!
//! The assumption checks are advisory. They never abort the analysis; only
//! structural problems (schema violations, incomplete repeated measures) are
//! returned as errors.
//!
//! Everything here is in-memory and synchronous. File ingestion, logging and
//! report output live in the `twoway` crate.
//!
//! # Features
//!
//! - `ansi` (default): colored significance markers in [`formatting`] output
//! - `parallel`: screen groups in parallel using rayon
//!
//! # Usage
//!
//! ```ignore
//! use twoway_core::{anova, posthoc, Dataset, Factor, Observation};
//!
//! let dataset = Dataset::new(conditions, times, observations)?;
//! let table = anova::fit(&dataset, false)?;
//! let contrasts = posthoc::compare_default(&table, &dataset)?;
//! ```

pub mod anova;
pub mod colors;
pub mod constants;
pub mod dataset;
pub mod distributions;
pub mod error;
pub mod formatting;
pub mod homogeneity;
pub mod normality;
pub mod outliers;
pub mod posthoc;
mod serde_util;
pub mod statistics;
pub mod table;
pub mod types;

#[cfg(any(test, feature = "fixtures"))]
#[doc(hidden)]
pub mod testing;

// Re-export commonly used items at crate root
pub use anova::{
    AnovaMode, AnovaOptions, AnovaResult, AnovaRow, ErrorTerm, Source, Sphericity,
    SphericityCorrection,
};
pub use dataset::{Dataset, Design, DesignWarning, Factor, FactorKind, Group, GroupSummary, Observation};
pub use error::{AnalysisError, SchemaError};
pub use homogeneity::{Bartlett, HomogeneityOutcome};
pub use normality::{GroupNormality, NormalityOutcome, ShapiroWilk};
pub use outliers::{Fences, GroupOutliers, Outlier, Severity};
pub use posthoc::{Contrast, ErrorTermSource, PostHocOptions, PostHocResult};
pub use table::Table;
pub use types::{IndeterminateReason, TestOutcome};
