//! Tukey-adjusted pairwise comparisons within each level of a second factor.
//!
//! For every level of the conditioning factor (by default Time) all pairs of
//! grouping-factor levels (by default Condition) are compared:
//!
//! ```text
//! estimate = mean(first) − mean(second)
//! SE       = √(MS_error · (1/n_first + 1/n_second))
//! t        = estimate / SE
//! ```
//!
//! The whole family, across every conditioning level, is adjusted together
//! with the studentized range over all `#conditions × #times` cell means:
//!
//! ```text
//! p_adj = P(Q > |t|·√2)            Q ~ range(nmeans, df)
//! CI    = estimate ± q_(1−α)/√2 · SE
//! ```
//!
//! # Error term
//!
//! Which mean square and degrees of freedom feed SE is an explicit choice
//! ([`ErrorTermSource`]):
//!
//! - [`FullModelResidual`](ErrorTermSource::FullModelResidual) uses the
//!   residual of the two-way between-subjects model whatever mode the ANOVA
//!   was fitted in. This reproduces the classic pooled computation.
//! - [`Stratified`](ErrorTermSource::Stratified) uses the error consistent
//!   with the fitted strata. Comparing conditions at one time mixes the
//!   between- and within-subject strata, so the two are pooled with
//!   Satterthwaite degrees of freedom. In between-subjects mode this is the
//!   residual again.

use serde::{Deserialize, Serialize};

use crate::anova::{AnovaResult, ErrorTerm};
use crate::constants::{DEFAULT_ALPHA, DEFAULT_CONFIDENCE_LEVEL};
use crate::dataset::{Dataset, FactorKind};
use crate::distributions::{ptukey, qtukey, t_two_sided};
use crate::error::AnalysisError;

/// Where the post-hoc standard errors take their error term from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorTermSource {
    /// Residual of the full two-way between-subjects model.
    #[default]
    FullModelResidual,
    /// Error of the fitted ANOVA's strata (pooled under repeated measures).
    Stratified,
}

impl std::fmt::Display for ErrorTermSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTermSource::FullModelResidual => write!(f, "full-model residual"),
            ErrorTermSource::Stratified => write!(f, "stratified"),
        }
    }
}

/// Options for the comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHocOptions {
    /// Error term source.
    pub error_term: ErrorTermSource,
    /// Family-wise confidence level of the intervals.
    pub confidence_level: f64,
    /// Threshold for the `significant` flag.
    pub alpha: f64,
}

impl Default for PostHocOptions {
    fn default() -> Self {
        Self {
            error_term: ErrorTermSource::default(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl PostHocOptions {
    /// Set the error term source.
    pub fn with_error_term(mut self, error_term: ErrorTermSource) -> Self {
        self.error_term = error_term;
        self
    }

    /// Set the confidence level.
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Set the significance threshold.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalysisError::InvalidOption {
                message: format!(
                    "confidence_level must be in (0, 1), got {}",
                    self.confidence_level
                ),
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnalysisError::InvalidOption {
                message: format!("alpha must be in (0, 1), got {}", self.alpha),
            });
        }
        Ok(())
    }
}

/// One pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contrast {
    /// Level of the conditioning factor the pair is compared at.
    pub level: String,
    /// First grouping level (minuend).
    pub first: String,
    /// Second grouping level (subtrahend).
    pub second: String,
    /// Difference of cell means, first − second.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub estimate: f64,
    /// Standard error of the difference.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub se: f64,
    /// Error degrees of freedom.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub df: f64,
    /// t-ratio.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub t_ratio: f64,
    /// Unadjusted two-sided p-value.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub p_value: f64,
    /// Tukey-adjusted p-value.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub adjusted_p_value: f64,
    /// Lower bound of the Tukey-adjusted interval.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub ci_lower: f64,
    /// Upper bound of the Tukey-adjusted interval.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub ci_upper: f64,
    /// Adjusted p-value below alpha.
    pub significant: bool,
}

/// The family of comparisons, ordered by conditioning level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHocResult {
    /// Factor whose levels are compared.
    pub grouping: FactorKind,
    /// Factor the comparisons are made within.
    pub by: FactorKind,
    /// Where the error term came from.
    pub error_source: ErrorTermSource,
    /// The error term used.
    pub error: ErrorTerm,
    /// Number of means spanned by the Tukey adjustment.
    pub nmeans: usize,
    /// Confidence level of the intervals.
    pub confidence_level: f64,
    /// Comparisons, grouped by conditioning level in level order.
    pub contrasts: Vec<Contrast>,
}

impl PostHocResult {
    /// Comparisons made at one conditioning level.
    pub fn at<'a>(&'a self, level: &'a str) -> impl Iterator<Item = &'a Contrast> + 'a {
        self.contrasts.iter().filter(move |c| c.level == level)
    }

    /// Significant comparisons.
    pub fn significant(&self) -> impl Iterator<Item = &Contrast> {
        self.contrasts.iter().filter(|c| c.significant)
    }

    /// Family size.
    pub fn len(&self) -> usize {
        self.contrasts.len()
    }

    /// Check if no comparisons were made.
    pub fn is_empty(&self) -> bool {
        self.contrasts.is_empty()
    }
}

/// Compare levels of `grouping` within each level of `by`.
///
/// # Arguments
///
/// * `anova` - ANOVA fitted to `dataset`
/// * `dataset` - The data the ANOVA was fitted to
/// * `grouping` - Factor whose levels are compared pairwise
/// * `by` - Factor the comparisons are made within
/// * `options` - Error term source, confidence level and alpha
///
/// # Errors
///
/// - `DatasetMismatch` if `anova` was fitted to a different number of observations
/// - `InvalidOption` if `grouping == by` or an option is out of range
pub fn compare(
    anova: &AnovaResult,
    dataset: &Dataset,
    grouping: FactorKind,
    by: FactorKind,
    options: &PostHocOptions,
) -> Result<PostHocResult, AnalysisError> {
    options.validate()?;
    if grouping == by {
        return Err(AnalysisError::InvalidOption {
            message: format!("cannot compare {} levels within {}", grouping, by),
        });
    }
    if anova.n_observations != dataset.len() {
        return Err(AnalysisError::DatasetMismatch {
            fitted: anova.n_observations,
            given: dataset.len(),
        });
    }

    let error = match options.error_term {
        ErrorTermSource::FullModelResidual => anova.full_model_residual,
        ErrorTermSource::Stratified => anova.stratified_error(by),
    };

    let nmeans = dataset.n_cells();
    let q_crit = qtukey(options.confidence_level, nmeans as f64, error.df);
    let half_width_factor = q_crit / std::f64::consts::SQRT_2;

    let grouping_factor = dataset.factor(grouping);
    let by_factor = dataset.factor(by);
    let k = grouping_factor.len();

    let mut contrasts = Vec::with_capacity(by_factor.len() * k * (k - 1) / 2);
    for level in 0..by_factor.len() {
        let cell = |g: usize| match grouping {
            FactorKind::Condition => dataset.group(g, level),
            FactorKind::Time => dataset.group(level, g),
        };

        for i in 0..k {
            for j in (i + 1)..k {
                let (first, second) = (cell(i), cell(j));
                let estimate = first.mean() - second.mean();
                let se = (error.ms * (1.0 / first.len() as f64 + 1.0 / second.len() as f64)).sqrt();
                let t_ratio = t_ratio(estimate, se);

                let p_value = t_two_sided(t_ratio, error.df);
                let adjusted_p_value = (1.0
                    - ptukey(t_ratio.abs() * std::f64::consts::SQRT_2, nmeans as f64, error.df))
                .clamp(0.0, 1.0);
                let half_width = half_width_factor * se;

                contrasts.push(Contrast {
                    level: by_factor.label(level).to_string(),
                    first: grouping_factor.label(i).to_string(),
                    second: grouping_factor.label(j).to_string(),
                    estimate,
                    se,
                    df: error.df,
                    t_ratio,
                    p_value,
                    adjusted_p_value,
                    ci_lower: estimate - half_width,
                    ci_upper: estimate + half_width,
                    significant: adjusted_p_value < options.alpha,
                });
            }
        }
    }

    Ok(PostHocResult {
        grouping,
        by,
        error_source: options.error_term,
        error,
        nmeans,
        confidence_level: options.confidence_level,
        contrasts,
    })
}

/// Compare conditions within each time with default options.
pub fn compare_default(
    anova: &AnovaResult,
    dataset: &Dataset,
) -> Result<PostHocResult, AnalysisError> {
    compare(
        anova,
        dataset,
        FactorKind::Condition,
        FactorKind::Time,
        &PostHocOptions::default(),
    )
}

/// t-ratio that treats 0/0 as no difference.
fn t_ratio(estimate: f64, se: f64) -> f64 {
    if se > 0.0 {
        estimate / se
    } else if estimate == 0.0 {
        0.0
    } else {
        estimate.signum() * f64::INFINITY
    }
}
