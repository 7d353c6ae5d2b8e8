//! The aggregated result of one analysis run.

use serde::{Deserialize, Serialize};

use twoway_core::{
    AnovaResult, Design, DesignWarning, GroupNormality, GroupOutliers, GroupSummary,
    HomogeneityOutcome, Outlier, PostHocResult, Severity, Source,
};

use crate::config::PipelineConfig;

/// Everything the pipeline produced, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Subject structure of the input.
    pub design: Design,
    /// Non-fatal design problems.
    pub warnings: Vec<DesignWarning>,
    /// Observations removed by the outlier policy, in input order.
    pub excluded: Vec<Outlier>,
    /// Descriptive statistics of the analysed cells.
    pub summaries: Vec<GroupSummary>,
    /// Outlier screen of the input, before any exclusion.
    pub outliers: Vec<GroupOutliers>,
    /// Shapiro-Wilk per analysed cell.
    pub normality: Vec<GroupNormality>,
    /// Bartlett's test across analysed cells.
    pub homogeneity: HomogeneityOutcome,
    /// The ANOVA table.
    pub anova: AnovaResult,
    /// Pairwise condition contrasts within each time.
    pub posthoc: PostHocResult,
    /// Configuration the run used.
    pub config: PipelineConfig,
}

/// An advisory note that a modelling assumption looks violated.
///
/// These never invalidate the report; they sit next to the results they
/// qualify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssumptionViolation {
    /// Shapiro-Wilk rejects normality in one cell.
    NonNormal {
        /// Condition label.
        condition: String,
        /// Time label.
        time: String,
        /// Shapiro-Wilk p-value.
        p_value: f64,
    },
    /// Bartlett's test rejects equal variances.
    UnequalVariances {
        /// Bartlett p-value.
        p_value: f64,
    },
    /// Mauchly's test rejects sphericity for a within-subject effect.
    Sphericity {
        /// The affected effect.
        source: Source,
        /// Mauchly p-value.
        mauchly_p: f64,
    },
    /// An extreme outlier is present in the input.
    ExtremeOutlier {
        /// Condition label.
        condition: String,
        /// Time label.
        time: String,
        /// Subject identifier.
        subject: String,
        /// Observed value.
        value: f64,
    },
}

impl std::fmt::Display for AssumptionViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonNormal {
                condition,
                time,
                p_value,
            } => write!(
                f,
                "non-normal values at ({}, {}): Shapiro-Wilk p = {:.4}",
                condition, time, p_value
            ),
            Self::UnequalVariances { p_value } => {
                write!(f, "unequal variances: Bartlett p = {:.4}", p_value)
            }
            Self::Sphericity { source, mauchly_p } => {
                write!(f, "sphericity violated for {}: Mauchly p = {:.4}", source, mauchly_p)
            }
            Self::ExtremeOutlier {
                condition,
                time,
                subject,
                value,
            } => write!(
                f,
                "extreme outlier at ({}, {}): subject {} = {}",
                condition, time, subject, value
            ),
        }
    }
}

impl Report {
    /// Assumption problems at the given significance threshold.
    ///
    /// Lists non-normal cells, unequal variances, sphericity violations and
    /// extreme outliers, in that order. Indeterminate tests are not listed.
    pub fn assumption_violations(&self, alpha: f64) -> Vec<AssumptionViolation> {
        let mut violations: Vec<AssumptionViolation> = self
            .normality
            .iter()
            .filter(|g| g.violates(alpha))
            .filter_map(|g| {
                g.outcome.tested().map(|sw| AssumptionViolation::NonNormal {
                    condition: g.condition.clone(),
                    time: g.time.clone(),
                    p_value: sw.p_value,
                })
            })
            .collect();

        if let Some(b) = self.homogeneity.tested().filter(|b| b.violates(alpha)) {
            violations.push(AssumptionViolation::UnequalVariances {
                p_value: b.p_value,
            });
        }

        violations.extend(self.anova.rows.iter().filter_map(|row| {
            row.sphericity
                .filter(|s| s.mauchly_p < alpha)
                .map(|s| AssumptionViolation::Sphericity {
                    source: row.source,
                    mauchly_p: s.mauchly_p,
                })
        }));

        for group in &self.outliers {
            violations.extend(group.with_severity(Severity::Extreme).map(|o| {
                AssumptionViolation::ExtremeOutlier {
                    condition: group.condition.clone(),
                    time: group.time.clone(),
                    subject: o.subject.clone(),
                    value: o.value,
                }
            }));
        }

        violations
    }

    /// Effects significant at the configured alpha.
    pub fn significant_effects(&self) -> Vec<Source> {
        self.anova
            .significant(self.config.alpha)
            .into_iter()
            .map(|r| r.source)
            .collect()
    }

    /// Number of observations the ANOVA was fitted to.
    pub fn n_analysed(&self) -> usize {
        self.anova.n_observations
    }
}
