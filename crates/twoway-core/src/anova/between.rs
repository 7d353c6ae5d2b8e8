//! Marginal means and the between-subjects decomposition.

use crate::dataset::Dataset;
use crate::error::AnalysisError;

use super::{AnovaMode, AnovaRow, ErrorTerm, Partition, Source};

/// Weighted marginal and cell means of a dataset.
///
/// Everything the decompositions share: the condition, time and
/// interaction sums of squares do not depend on how subjects are arranged.
pub(super) struct Margins {
    pub a: usize,
    pub b: usize,
    pub n: usize,
    pub grand: f64,
    pub condition_means: Vec<f64>,
    pub condition_n: Vec<usize>,
    pub time_means: Vec<f64>,
    pub time_n: Vec<usize>,
    /// Condition-major.
    pub cell_means: Vec<f64>,
    pub cell_n: Vec<usize>,
    pub total_ss: f64,
    pub balanced: bool,
    /// Σ (y − cell mean)² over all observations.
    pub within_cell_ss: f64,
}

impl Margins {
    pub fn new(dataset: &Dataset) -> Self {
        let a = dataset.conditions().len();
        let b = dataset.times().len();
        let n = dataset.len();

        let mut condition_sum = vec![0.0; a];
        let mut condition_n = vec![0usize; a];
        let mut time_sum = vec![0.0; b];
        let mut time_n = vec![0usize; b];
        let mut cell_sum = vec![0.0; a * b];
        let mut cell_n = vec![0usize; a * b];

        for obs in dataset.observations() {
            condition_sum[obs.condition] += obs.value;
            condition_n[obs.condition] += 1;
            time_sum[obs.time] += obs.value;
            time_n[obs.time] += 1;
            cell_sum[obs.condition * b + obs.time] += obs.value;
            cell_n[obs.condition * b + obs.time] += 1;
        }

        let ratio = |sums: &[f64], counts: &[usize]| -> Vec<f64> {
            sums.iter()
                .zip(counts)
                .map(|(s, &c)| s / c as f64)
                .collect()
        };
        let condition_means = ratio(&condition_sum, &condition_n);
        let time_means = ratio(&time_sum, &time_n);
        let cell_means = ratio(&cell_sum, &cell_n);
        let grand = dataset.grand_mean();

        let mut total_ss = 0.0;
        let mut within_cell_ss = 0.0;
        for obs in dataset.observations() {
            total_ss += (obs.value - grand).powi(2);
            within_cell_ss += (obs.value - cell_means[obs.condition * b + obs.time]).powi(2);
        }

        Self {
            a,
            b,
            n,
            grand,
            condition_means,
            condition_n,
            time_means,
            time_n,
            cell_means,
            balanced: cell_n.windows(2).all(|w| w[0] == w[1]),
            cell_n,
            total_ss,
            within_cell_ss,
        }
    }

    pub fn ss_condition(&self) -> f64 {
        self.condition_means
            .iter()
            .zip(&self.condition_n)
            .map(|(m, &k)| k as f64 * (m - self.grand).powi(2))
            .sum()
    }

    pub fn ss_time(&self) -> f64 {
        self.time_means
            .iter()
            .zip(&self.time_n)
            .map(|(m, &k)| k as f64 * (m - self.grand).powi(2))
            .sum()
    }

    /// Interaction sum of squares.
    ///
    /// Balanced designs use the direct sum of squared interaction residuals,
    /// which cannot go negative. Unbalanced designs take what the cell means
    /// explain beyond both main effects.
    pub fn ss_interaction(&self) -> f64 {
        if self.balanced {
            (0..self.a * self.b)
                .map(|idx| {
                    let (i, j) = (idx / self.b, idx % self.b);
                    let dev = self.cell_means[idx] - self.condition_means[i]
                        - self.time_means[j]
                        + self.grand;
                    self.cell_n[idx] as f64 * dev * dev
                })
                .sum()
        } else {
            let ss_cells: f64 = self
                .cell_means
                .iter()
                .zip(&self.cell_n)
                .map(|(m, &k)| k as f64 * (m - self.grand).powi(2))
                .sum();
            ss_cells - self.ss_condition() - self.ss_time()
        }
    }

    /// Error degrees of freedom of the full two-way model.
    pub fn residual_df(&self) -> usize {
        self.n.saturating_sub(self.a * self.b)
    }

    /// Residual of the full two-way between-subjects model.
    ///
    /// With no replication the mean square is NaN and df is 0.
    pub fn residual(&self) -> ErrorTerm {
        let df = self.residual_df();
        ErrorTerm {
            ms: self.within_cell_ss / df as f64,
            df: df as f64,
        }
    }
}

/// Classic two-way fixed-effects table.
pub(super) fn partition(margins: &Margins) -> Result<Partition, AnalysisError> {
    let df_residual = margins.residual_df();
    if df_residual == 0 {
        return Err(AnalysisError::DegenerateError {
            stratum: Source::Residual.to_string(),
        });
    }

    let residual = AnovaRow::error(Source::Residual, df_residual, margins.within_cell_ss);
    let df_c = margins.a - 1;
    let df_t = margins.b - 1;

    let rows = vec![
        AnovaRow::effect(Source::Condition, df_c, margins.ss_condition(), &residual),
        AnovaRow::effect(Source::Time, df_t, margins.ss_time(), &residual),
        AnovaRow::effect(
            Source::ConditionTime,
            df_c * df_t,
            margins.ss_interaction(),
            &residual,
        ),
        residual,
    ];

    let error = margins.residual();
    Ok(Partition {
        mode: AnovaMode::BetweenSubjects,
        rows,
        n_subjects: None,
        within_time_error: error,
        within_condition_error: error,
    })
}
