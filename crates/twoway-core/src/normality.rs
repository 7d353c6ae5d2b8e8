//! Shapiro-Wilk test of normality.
//!
//! Uses Royston's (1995) algorithm AS R94: the coefficients are approximated
//! from normal order-statistic scores and the W statistic is mapped to a
//! p-value by a normalizing transformation that depends on the sample size.
//! Supported sample sizes are 3 to 5000. For n = 3 the exact distribution is
//! used.
//!
//! The test only reports; interpretation of p against a threshold is left to
//! the caller (see [`GroupNormality::violates`]).

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::constants::{SHAPIRO_MAX_N, SHAPIRO_MIN_N, ZERO_RANGE};
use crate::dataset::{Dataset, Group};
use crate::distributions::{normal_quantile, normal_sf};
use crate::statistics::sorted;
use crate::types::{IndeterminateReason, TestOutcome};

/// A computed Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    /// The W statistic, in (0, 1].
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub statistic: f64,
    /// p-value for the null hypothesis of normality.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub p_value: f64,
    /// Sample size.
    pub n: usize,
}

/// Outcome of a normality test.
pub type NormalityOutcome = TestOutcome<ShapiroWilk>;

/// Evaluate a polynomial with coefficients in ascending order.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Run the Shapiro-Wilk test on a sample.
///
/// # Returns
///
/// `Indeterminate` when n < 3, n > 5000 or all values are identical;
/// otherwise the statistic and p-value.
pub fn shapiro_wilk(values: &[f64]) -> NormalityOutcome {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
    const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
    const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
    const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
    const G: [f64; 2] = [-2.273, 0.459];
    const SMALL: f64 = 1e-19;

    let n = values.len();
    if n < SHAPIRO_MIN_N {
        return TestOutcome::Indeterminate(IndeterminateReason::InsufficientData {
            required: SHAPIRO_MIN_N,
            got: n,
        });
    }
    if n > SHAPIRO_MAX_N {
        return TestOutcome::Indeterminate(IndeterminateReason::TooManyObservations {
            max: SHAPIRO_MAX_N,
            got: n,
        });
    }

    let x = sorted(values);
    let range = x[n - 1] - x[0];
    if range < ZERO_RANGE {
        return TestOutcome::Indeterminate(IndeterminateReason::ZeroRange);
    }

    let nn2 = n / 2;
    let an = n as f64;

    // Coefficients for the lower half (antisymmetric around the median)
    let mut a = vec![0.0; nn2];
    if n == 3 {
        a[0] = std::f64::consts::FRAC_1_SQRT_2;
    } else {
        let an25 = an + 0.25;
        let m: Vec<f64> = (0..nn2)
            .map(|i| normal_quantile(((i + 1) as f64 - 0.375) / an25))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - m[0] / ssumm2;

        let (i1, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * (m[0] * m[0]) - 2.0 * (m[1] * m[1]))
                / (1.0 - 2.0 * (a1 * a1) - 2.0 * (a2 * a2)))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * (m[0] * m[0])) / (1.0 - 2.0 * (a1 * a1))).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for i in i1..nn2 {
            a[i] = -m[i] / fac;
        }
    }

    // W is the squared correlation of the ordered sample with the coefficients
    let xx: Vec<f64> = x.iter().map(|v| v / range).collect();
    let mean = xx.iter().sum::<f64>() / an;
    let ssq: f64 = xx.iter().map(|v| (v - mean) * (v - mean)).sum();
    let ssa = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
    let sax: f64 = (0..nn2).map(|i| a[i] * (xx[n - 1 - i] - xx[i])).sum();
    let ssassx = (ssa * ssq).sqrt();
    let w1 = ((ssassx - sax) * (ssassx + sax) / (ssa * ssq)).max(0.0);
    let w = 1.0 - w1;

    let p_value = if n == 3 {
        const PI6: f64 = 1.909_859_317_102_744; // 6/π
        const STQR: f64 = 1.047_197_551_196_598; // π/3
        (PI6 * (w.sqrt().asin() - STQR)).max(0.0)
    } else if w1 <= SMALL {
        1.0
    } else {
        let (m, s, y) = if n <= 11 {
            let gamma = poly(&G, an);
            let y = w1.ln();
            if y >= gamma {
                return TestOutcome::Tested(ShapiroWilk {
                    statistic: w,
                    p_value: 1e-99,
                    n,
                });
            }
            (poly(&C3, an), poly(&C4, an).exp(), -((gamma - y).ln()))
        } else {
            let xx = an.ln();
            (poly(&C5, xx), poly(&C6, xx).exp(), w1.ln())
        };
        normal_sf((y - m) / s)
    };

    TestOutcome::Tested(ShapiroWilk {
        statistic: w,
        p_value: p_value.clamp(0.0, 1.0),
        n,
    })
}

/// Normality test result for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNormality {
    /// Condition label.
    pub condition: String,
    /// Time label.
    pub time: String,
    /// The test outcome.
    pub outcome: NormalityOutcome,
}

impl GroupNormality {
    /// Check if the group fails normality at `alpha` (p ≤ alpha).
    ///
    /// Indeterminate outcomes never count as violations.
    pub fn violates(&self, alpha: f64) -> bool {
        self.outcome
            .tested()
            .is_some_and(|sw| sw.p_value <= alpha)
    }
}

/// Test normality of one group.
pub fn test(group: &Group<'_>) -> GroupNormality {
    GroupNormality {
        condition: group.condition_label().to_string(),
        time: group.time_label().to_string(),
        outcome: shapiro_wilk(group.values()),
    }
}

/// Test every group of a dataset, in [`Dataset::groups`] order.
pub fn screen(dataset: &Dataset) -> Vec<GroupNormality> {
    let groups = dataset.groups();

    #[cfg(feature = "parallel")]
    let results = groups.par_iter().map(test).collect();

    #[cfg(not(feature = "parallel"))]
    let results = groups.iter().map(test).collect();

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tested(values: &[f64]) -> ShapiroWilk {
        match shapiro_wilk(values) {
            TestOutcome::Tested(sw) => sw,
            TestOutcome::Indeterminate(reason) => panic!("indeterminate: {}", reason),
        }
    }

    #[test]
    fn test_small_samples_indeterminate() {
        for values in [&[][..], &[1.0][..], &[1.0, 2.0][..]] {
            assert_eq!(
                shapiro_wilk(values),
                TestOutcome::Indeterminate(IndeterminateReason::InsufficientData {
                    required: 3,
                    got: values.len()
                })
            );
        }
    }

    #[test]
    fn test_constant_sample_indeterminate() {
        assert_eq!(
            shapiro_wilk(&[2.0, 2.0, 2.0, 2.0]),
            TestOutcome::Indeterminate(IndeterminateReason::ZeroRange)
        );
    }

    #[test]
    fn test_three_equally_spaced_values() {
        // Equally spaced triples are perfectly "normal" for n = 3: W = 1, p = 1
        let sw = tested(&[1.0, 2.0, 3.0]);
        assert!((sw.statistic - 1.0).abs() < 1e-12);
        assert!((sw.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_three_values_reference() {
        // R: shapiro.test(c(1, 2, 4)) W = 0.96429, p = 0.6369
        let sw = tested(&[1.0, 2.0, 4.0]);
        assert!((sw.statistic - 0.96429).abs() < 1e-4);
        assert!((sw.p_value - 0.6369).abs() < 1e-3);
    }

    #[test]
    fn test_extreme_value_rejects_normality() {
        let sw = tested(&[9.0, 10.0, 10.0, 11.0, 1000.0]);
        assert!(sw.statistic < 0.6);
        assert!(sw.p_value < 0.05);
    }

    #[test]
    fn test_evenly_spread_sample_accepted() {
        let values: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let sw = tested(&values);
        // R: shapiro.test(1:20) W = 0.96, p = 0.5
        assert!(sw.statistic > 0.95 && sw.statistic < 0.97);
        assert!(sw.p_value > 0.3);
    }

    #[test]
    fn test_skewed_sample_rejected() {
        let values: Vec<f64> = (0..30).map(|i| (i as f64 * 0.25).exp()).collect();
        let sw = tested(&values);
        assert!(sw.p_value < 0.01);
    }

    #[test]
    fn test_seeded_lognormal_rejected() {
        use rand::SeedableRng;
        use rand_distr::{Distribution, LogNormal};

        let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(7);
        let dist = LogNormal::new(0.0, 1.5).unwrap();
        let values: Vec<f64> = (0..200).map(|_| dist.sample(&mut rng)).collect();
        let sw = tested(&values);
        assert!(sw.statistic < 0.8);
        assert!(sw.p_value < 1e-6);
        assert_eq!(sw.n, 200);
    }

    #[test]
    fn test_violation_threshold() {
        let g = GroupNormality {
            condition: "a".into(),
            time: "1".into(),
            outcome: TestOutcome::Tested(ShapiroWilk {
                statistic: 0.9,
                p_value: 0.05,
                n: 10,
            }),
        };
        assert!(g.violates(0.05));
        assert!(!g.violates(0.01));

        let indeterminate = GroupNormality {
            outcome: TestOutcome::Indeterminate(IndeterminateReason::ZeroRange),
            ..g
        };
        assert!(!indeterminate.violates(0.05));
    }
}
