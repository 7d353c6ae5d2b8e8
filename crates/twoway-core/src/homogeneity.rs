//! Bartlett's test for homogeneity of variances across all cells.
//!
//! ```text
//! K² = [(N − k) ln Sp² − Σ (nᵢ − 1) ln sᵢ²] / C
//! C  = 1 + (Σ 1/(nᵢ − 1) − 1/(N − k)) / (3 (k − 1))
//! ```
//!
//! with Sp² the pooled variance. Under equal variances K² is approximately
//! chi-square with k − 1 degrees of freedom.
//!
//! Bartlett's test is sensitive to non-normality: heavy tails inflate K² even
//! when variances are equal. That sensitivity is accepted as a known
//! limitation; a rejection is reported alongside the normality results so the
//! two can be read together.

use serde::{Deserialize, Serialize};

use crate::constants::BARTLETT_MIN_N;
use crate::dataset::Group;
use crate::distributions::chi_squared_upper_tail;
use crate::statistics::variance;
use crate::types::{IndeterminateReason, TestOutcome};

/// A computed Bartlett test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bartlett {
    /// The K² statistic.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub statistic: f64,
    /// Degrees of freedom (groups − 1).
    pub df: usize,
    /// Upper-tail chi-square p-value.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub p_value: f64,
    /// Number of groups compared.
    pub groups: usize,
}

impl Bartlett {
    /// Check if equal variances are rejected at `alpha`.
    pub fn violates(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

/// Outcome of a homogeneity test.
pub type HomogeneityOutcome = TestOutcome<Bartlett>;

/// Bartlett's test over raw samples.
///
/// # Returns
///
/// `Indeterminate` if fewer than two samples are given, if any sample has
/// fewer than two values, or if any sample has zero variance.
pub fn bartlett(samples: &[&[f64]]) -> HomogeneityOutcome {
    let k = samples.len();
    if k < 2 {
        return TestOutcome::Indeterminate(IndeterminateReason::TooFewGroups { got: k });
    }
    if let Some(small) = samples.iter().map(|s| s.len()).find(|&n| n < BARTLETT_MIN_N) {
        return TestOutcome::Indeterminate(IndeterminateReason::InsufficientData {
            required: BARTLETT_MIN_N,
            got: small,
        });
    }

    let variances: Vec<f64> = samples.iter().map(|s| variance(s)).collect();
    if variances.iter().any(|&v| !(v > 0.0)) {
        return TestOutcome::Indeterminate(IndeterminateReason::ZeroVariance);
    }

    let dfs: Vec<f64> = samples.iter().map(|s| (s.len() - 1) as f64).collect();
    let df_total: f64 = dfs.iter().sum();
    let pooled = dfs.iter().zip(&variances).map(|(d, v)| d * v).sum::<f64>() / df_total;

    let numerator = df_total * pooled.ln()
        - dfs
            .iter()
            .zip(&variances)
            .map(|(d, v)| d * v.ln())
            .sum::<f64>();
    let correction = 1.0
        + (dfs.iter().map(|d| 1.0 / d).sum::<f64>() - 1.0 / df_total) / (3.0 * (k - 1) as f64);

    let statistic = (numerator / correction).max(0.0);
    let df = k - 1;

    TestOutcome::Tested(Bartlett {
        statistic,
        df,
        p_value: chi_squared_upper_tail(statistic, df as f64),
        groups: k,
    })
}

/// Bartlett's test across the given groups simultaneously.
pub fn test(groups: &[Group<'_>]) -> HomogeneityOutcome {
    let samples: Vec<&[f64]> = groups.iter().map(|g| g.values()).collect();
    bartlett(&samples)
}
