//! Two-way factorial analysis of variance.
//!
//! Two fitting modes are supported:
//!
//! - **Between-subjects**: the classic fixed-effects decomposition into
//!   Condition, Time, Condition:Time and Residuals, every effect tested
//!   against the single residual mean square.
//! - **Repeated measures**: the subject blocks are removed from the residual
//!   and every effect is tested against the error stratum it lives in. Which
//!   strata exist depends on the [`Design`]:
//!   - condition between subjects (mixed design): Condition is tested against
//!     Subject-within-Condition, Time and Condition:Time against
//!     Time × Subject-within-Condition;
//!   - condition within subjects: Condition, Time and Condition:Time are
//!     tested against their own interaction with Subject.
//!
//! In every mode the sums of squares of all rows add up to the total sum of
//! squares. In balanced designs every row is non-negative; in unbalanced
//! designs the interaction is obtained by subtraction (see
//! [`DesignWarning::UnbalancedDesign`](crate::DesignWarning)).
//!
//! Within-subject effects with more than one numerator degree of freedom are
//! checked for sphericity (see [`Sphericity`]).

mod between;
mod repeated;
mod sphericity;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ALPHA, SS_PARTITION_TOLERANCE};
use crate::dataset::{Dataset, Design, FactorKind};
use crate::distributions::f_upper_tail;
use crate::error::AnalysisError;

use between::Margins;

// =============================================================================
// Table types
// =============================================================================

/// Source of variation in the ANOVA table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Condition main effect.
    Condition,
    /// Time main effect.
    Time,
    /// Condition × Time interaction.
    ConditionTime,
    /// Between-subject variability (nested in Condition for mixed designs).
    Subject,
    /// Condition × Subject (within designs only).
    ConditionSubject,
    /// Time × Subject (within designs only).
    TimeSubject,
    /// Residual variability.
    Residual,
}

impl Source {
    /// Check if this row is an error stratum rather than a tested effect.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Source::Subject | Source::ConditionSubject | Source::TimeSubject | Source::Residual
        )
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Condition => write!(f, "Condition"),
            Source::Time => write!(f, "Time"),
            Source::ConditionTime => write!(f, "Condition:Time"),
            Source::Subject => write!(f, "Subject"),
            Source::ConditionSubject => write!(f, "Condition:Subject"),
            Source::TimeSubject => write!(f, "Time:Subject"),
            Source::Residual => write!(f, "Residuals"),
        }
    }
}

/// Which decomposition produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnovaMode {
    /// Single residual error term.
    BetweenSubjects,
    /// Repeated measures with Condition between subjects and Time within.
    Mixed,
    /// Repeated measures with both factors within subjects.
    Within,
}

impl std::fmt::Display for AnovaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnovaMode::BetweenSubjects => write!(f, "between-subjects"),
            AnovaMode::Mixed => write!(f, "repeated measures (mixed)"),
            AnovaMode::Within => write!(f, "repeated measures (within)"),
        }
    }
}

/// When to apply the Greenhouse-Geisser degrees-of-freedom correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SphericityCorrection {
    /// Never correct.
    None,
    /// Always correct within-subject effects.
    GreenhouseGeisser,
    /// Correct only when Mauchly's test rejects sphericity at alpha.
    #[default]
    Auto,
}

/// Sphericity diagnostics for one within-subject effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphericity {
    /// Mauchly's W (NaN when there are fewer subjects than contrasts).
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub mauchly_w: f64,
    /// p-value of Mauchly's test.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub mauchly_p: f64,
    /// Greenhouse-Geisser epsilon.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub gg_epsilon: f64,
    /// Huynh-Feldt epsilon, capped at 1.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub hf_epsilon: f64,
    /// p-value with both dfs multiplied by the Greenhouse-Geisser epsilon.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub corrected_p_value: f64,
    /// Whether the corrected p-value is the reported one.
    pub applied: bool,
}

/// Mean square and degrees of freedom of an error term.
///
/// Degrees of freedom are real-valued because pooled error terms use a
/// Satterthwaite approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorTerm {
    /// Error mean square.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub ms: f64,
    /// Error degrees of freedom.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub df: f64,
}

impl ErrorTerm {
    /// Pool two strata as `(ms_a + weight · ms_b) / (1 + weight)`.
    ///
    /// This is the variance of a difference between cell means when one
    /// factor is between strata and the other within: the between-stratum
    /// error enters once and the within-stratum error `weight` times. The
    /// degrees of freedom follow Satterthwaite.
    pub fn pooled(a: ErrorTerm, b: ErrorTerm, weight: f64) -> ErrorTerm {
        let ms = (a.ms + weight * b.ms) / (1.0 + weight);
        let numerator = (a.ms + weight * b.ms).powi(2);
        let denominator = a.ms.powi(2) / a.df + (weight * b.ms).powi(2) / b.df;
        let df = numerator / denominator;
        let df = if df.is_finite() && df > 0.0 { df } else { a.df + b.df };
        ErrorTerm { ms, df }
    }
}

/// One line of the ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    /// Source of variation.
    pub source: Source,
    /// Degrees of freedom.
    pub df: usize,
    /// Sum of squares.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub ss: f64,
    /// Mean square (SS / df).
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub ms: f64,
    /// F statistic, for tested effects.
    pub f: Option<f64>,
    /// Uncorrected p-value, for tested effects.
    pub p_value: Option<f64>,
    /// The row whose mean square is the denominator of F.
    pub error_term: Option<Source>,
    /// Generalized eta squared, for tested effects.
    pub ges: Option<f64>,
    /// Sphericity diagnostics, for within-subject effects with df > 1.
    pub sphericity: Option<Sphericity>,
}

impl AnovaRow {
    fn error(source: Source, df: usize, ss: f64) -> Self {
        Self {
            source,
            df,
            ss,
            ms: ss / df as f64,
            f: None,
            p_value: None,
            error_term: None,
            ges: None,
            sphericity: None,
        }
    }

    fn effect(source: Source, df: usize, ss: f64, error: &AnovaRow) -> Self {
        let ms = ss / df as f64;
        let f = if error.ms > 0.0 {
            Some(ms / error.ms)
        } else if ms > 0.0 {
            Some(f64::INFINITY)
        } else {
            None
        };
        let p_value = f.map(|f| f_upper_tail(f, df as f64, error.df as f64));
        Self {
            source,
            df,
            ss,
            ms,
            f,
            p_value,
            error_term: Some(error.source),
            ges: None,
            sphericity: None,
        }
    }

    /// The p-value to report: sphericity-corrected when the correction was
    /// applied, uncorrected otherwise.
    pub fn reported_p_value(&self) -> Option<f64> {
        match self.sphericity {
            Some(s) if s.applied => Some(s.corrected_p_value),
            _ => self.p_value,
        }
    }

    /// Check if this effect is significant at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.reported_p_value().is_some_and(|p| p < alpha)
    }
}

/// A fitted ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    /// Decomposition used.
    pub mode: AnovaMode,
    /// Table rows, effects and error strata in display order.
    pub rows: Vec<AnovaRow>,
    /// Total sum of squares about the grand mean.
    pub total_ss: f64,
    /// Total degrees of freedom (N − 1).
    pub total_df: usize,
    /// Number of observations the model was fitted to.
    pub n_observations: usize,
    /// Number of subjects (repeated-measures modes only).
    pub n_subjects: Option<usize>,
    /// Whether all cells had the same size.
    pub balanced: bool,
    /// Residual of the full two-way between-subjects model.
    pub full_model_residual: ErrorTerm,
    /// Error for comparing conditions within one time level.
    pub within_time_error: ErrorTerm,
    /// Error for comparing time levels within one condition.
    pub within_condition_error: ErrorTerm,
}

impl AnovaResult {
    /// Look up a row by source.
    pub fn row(&self, source: Source) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.source == source)
    }

    /// Sum of all row sums of squares.
    pub fn ss_sum(&self) -> f64 {
        self.rows.iter().map(|r| r.ss).sum()
    }

    /// Check that the rows partition the total sum of squares within
    /// `tolerance`, relative to the total.
    pub fn partition_holds(&self, tolerance: f64) -> bool {
        (self.ss_sum() - self.total_ss).abs() <= tolerance * self.total_ss.abs().max(1.0)
    }

    /// Tested effects significant at `alpha`.
    pub fn significant(&self, alpha: f64) -> Vec<&AnovaRow> {
        self.rows.iter().filter(|r| r.is_significant(alpha)).collect()
    }

    /// Stratified error for comparing levels of one factor at a fixed level
    /// of `by`.
    pub fn stratified_error(&self, by: FactorKind) -> ErrorTerm {
        match by {
            FactorKind::Time => self.within_time_error,
            FactorKind::Condition => self.within_condition_error,
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Options controlling the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaOptions {
    /// Use the stratified repeated-measures decomposition.
    pub repeated_measures: bool,
    /// Sphericity correction policy for within-subject effects.
    pub sphericity: SphericityCorrection,
    /// Threshold for Mauchly's test under [`SphericityCorrection::Auto`].
    pub alpha: f64,
}

impl Default for AnovaOptions {
    fn default() -> Self {
        Self {
            repeated_measures: false,
            sphericity: SphericityCorrection::Auto,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl AnovaOptions {
    /// Set repeated-measures mode.
    pub fn with_repeated_measures(mut self, repeated_measures: bool) -> Self {
        self.repeated_measures = repeated_measures;
        self
    }

    /// Set the sphericity policy.
    pub fn with_sphericity(mut self, sphericity: SphericityCorrection) -> Self {
        self.sphericity = sphericity;
        self
    }

    /// Set the Mauchly threshold.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnalysisError::InvalidOption {
                message: format!("alpha must be in (0, 1), got {}", self.alpha),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Fitting
// =============================================================================

/// Rows and pooled errors produced by one decomposition.
struct Partition {
    mode: AnovaMode,
    rows: Vec<AnovaRow>,
    n_subjects: Option<usize>,
    within_time_error: ErrorTerm,
    within_condition_error: ErrorTerm,
}

/// Fit the two-way ANOVA with default options.
///
/// # Arguments
///
/// * `dataset` - Validated observations
/// * `repeated_measures` - Use the subject-stratified decomposition
///
/// # Errors
///
/// - `DegenerateError` if an error stratum has no degrees of freedom
/// - `MissingRepeatedMeasure` / `InconsistentSubject` in repeated-measures
///   mode when subjects are incomplete or neither nested nor crossed
pub fn fit(dataset: &Dataset, repeated_measures: bool) -> Result<AnovaResult, AnalysisError> {
    fit_with(
        dataset,
        &AnovaOptions::default().with_repeated_measures(repeated_measures),
    )
}

/// Fit the two-way ANOVA with explicit options.
///
/// See [`fit`] for errors.
pub fn fit_with(dataset: &Dataset, options: &AnovaOptions) -> Result<AnovaResult, AnalysisError> {
    options.validate()?;

    let margins = Margins::new(dataset);
    let full_model_residual = margins.residual();

    let partition = if options.repeated_measures {
        repeated::partition(dataset, &margins, options)?
    } else {
        between::partition(&margins)?
    };

    let mut rows = partition.rows;
    let error_ss: f64 = rows
        .iter()
        .filter(|r| r.source.is_error())
        .map(|r| r.ss)
        .sum();
    for row in rows.iter_mut().filter(|r| !r.source.is_error()) {
        let denominator = row.ss + error_ss;
        row.ges = Some(if denominator > 0.0 {
            row.ss / denominator
        } else {
            0.0
        });
    }

    let result = AnovaResult {
        mode: partition.mode,
        rows,
        total_ss: margins.total_ss,
        total_df: margins.n - 1,
        n_observations: margins.n,
        n_subjects: partition.n_subjects,
        balanced: margins.balanced,
        full_model_residual,
        within_time_error: partition.within_time_error,
        within_condition_error: partition.within_condition_error,
    };

    debug_assert!(
        result.partition_holds(SS_PARTITION_TOLERANCE),
        "sum of squares partition violated"
    );

    Ok(result)
}

/// Mode that repeated-measures fitting will use for a design.
pub fn repeated_mode(design: Design) -> Option<AnovaMode> {
    match design {
        Design::BetweenSubjects => Some(AnovaMode::Mixed),
        Design::WithinSubjects => Some(AnovaMode::Within),
        Design::Unstructured => None,
    }
}
