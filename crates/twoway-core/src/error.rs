//! Error types for dataset construction and analysis.
//!
//! Only structural failures are errors. Assumption-check problems (a group
//! too small for a test, non-normality, heteroscedasticity) are reported as
//! [`TestOutcome::Indeterminate`](crate::types::TestOutcome) or as advisory
//! annotations, and the analysis continues.

use thiserror::Error;

/// Malformed input that prevents a [`Dataset`](crate::Dataset) from being built.
///
/// Schema errors are fatal: no partial result is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A required column is absent from the input table.
    #[error("missing required column '{column}'")]
    MissingColumn {
        /// Name of the expected column.
        column: String,
    },

    /// The outcome column holds something that is not a number.
    #[error("non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumericValue {
        /// Data row (1-indexed, header excluded).
        row: usize,
        /// Column name.
        column: String,
        /// The offending cell content.
        value: String,
    },

    /// An outcome value is NaN or infinite.
    #[error("non-finite outcome value at observation {index}")]
    NonFiniteValue {
        /// Position of the observation in input order.
        index: usize,
    },

    /// A label is not part of the factor's declared level set.
    #[error("unknown {factor} level '{label}'")]
    UnknownLevel {
        /// Factor name.
        factor: String,
        /// The unrecognised label.
        label: String,
    },

    /// An observation refers to a level index the factor does not have.
    #[error("{factor} level index {index} out of range ({levels} levels)")]
    LevelOutOfRange {
        /// Factor name.
        factor: String,
        /// The offending index.
        index: usize,
        /// Number of declared levels.
        levels: usize,
    },

    /// A factor declares the same label twice.
    #[error("{factor} level '{label}' declared more than once")]
    DuplicateLevel {
        /// Factor name.
        factor: String,
        /// The repeated label.
        label: String,
    },

    /// A factor has fewer than two levels.
    #[error("factor '{factor}' needs at least 2 levels, got {got}")]
    TooFewLevels {
        /// Factor name.
        factor: String,
        /// Number of levels found.
        got: usize,
    },

    /// A (condition, time) cell has no observations.
    #[error("cell ({condition}, {time}) has no observations")]
    EmptyCell {
        /// Condition label.
        condition: String,
        /// Time label.
        time: String,
    },

    /// The same subject is observed twice in one cell.
    #[error("subject '{subject}' has more than one observation at ({condition}, {time})")]
    DuplicateObservation {
        /// Subject identifier.
        subject: String,
        /// Condition label.
        condition: String,
        /// Time label.
        time: String,
    },
}

/// Errors that abort an analysis stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The dataset itself is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A subject lacks an expected observation under repeated-measures mode.
    ///
    /// The stratified decomposition needs every subject observed in every
    /// cell it belongs to. Subjects are never dropped silently.
    #[error(
        "subject '{subject}' has no observation at ({condition}, {time}); \
         repeated-measures mode needs complete subjects"
    )]
    MissingRepeatedMeasure {
        /// Subject identifier.
        subject: String,
        /// Condition label of the missing cell.
        condition: String,
        /// Time label of the missing cell.
        time: String,
    },

    /// Subjects are neither nested in conditions nor crossed with them.
    #[error(
        "subject '{subject}' is observed under some but not all conditions; \
         the design is neither between- nor within-subjects"
    )]
    InconsistentSubject {
        /// Subject identifier.
        subject: String,
    },

    /// An error stratum has zero degrees of freedom, so no F-ratio exists.
    #[error("error stratum '{stratum}' has no degrees of freedom")]
    DegenerateError {
        /// Name of the stratum.
        stratum: String,
    },

    /// The post-hoc engine was handed an ANOVA fitted to different data.
    #[error("ANOVA was fitted to {fitted} observations but the dataset has {given}")]
    DatasetMismatch {
        /// Observations the ANOVA saw.
        fitted: usize,
        /// Observations in the dataset passed alongside it.
        given: usize,
    },

    /// An option is outside its valid range.
    #[error("invalid option: {message}")]
    InvalidOption {
        /// What was wrong.
        message: String,
    },
}
