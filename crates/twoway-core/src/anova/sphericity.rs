//! Sphericity diagnostics for within-subject effects.
//!
//! Each within-subject effect is described by an orthonormal contrast matrix
//! over the within-subject cells. Projecting every subject's scores onto the
//! contrasts and pooling the covariance within between-subject groups gives
//! the matrix S whose departure from a multiple of the identity is what
//! Mauchly's test and the epsilons measure.
//!
//! ```text
//! ε_GG = tr(S)² / (p · tr(S²))
//! ε_HF = ((d + 1) · p · ε_GG − 2) / (p · (d − p · ε_GG))      (capped at 1)
//! ```
//!
//! with p contrasts and d error degrees of freedom.

use nalgebra::{Cholesky, DMatrix};

use crate::distributions::chi_squared_upper_tail;

use super::Sphericity;

/// Orthonormal contrasts for `k` levels (k × (k − 1), columns orthogonal to
/// the constant vector).
pub(super) fn helmert(k: usize) -> DMatrix<f64> {
    DMatrix::from_fn(k, k.saturating_sub(1), |row, col| {
        let level = col + 1;
        let norm = ((level * (level + 1)) as f64).sqrt();
        if row < level {
            1.0 / norm
        } else if row == level {
            -(level as f64) / norm
        } else {
            0.0
        }
    })
}

/// Unit averaging vector for `k` levels as a k × 1 matrix.
pub(super) fn average(k: usize) -> DMatrix<f64> {
    DMatrix::from_element(k, 1, 1.0 / (k as f64).sqrt())
}

/// Mauchly's test and the epsilons for one effect.
///
/// # Arguments
///
/// * `scores` - Subjects × within-subject cells
/// * `groups` - Between-subject group of every subject
/// * `n_groups` - Number of between-subject groups
/// * `contrasts` - Cells × p orthonormal contrasts of the effect
///
/// # Returns
///
/// `None` for single-df effects, when no error df remain, or when the
/// projected scores carry no variance.
pub(super) fn assess(
    scores: &DMatrix<f64>,
    groups: &[usize],
    n_groups: usize,
    contrasts: &DMatrix<f64>,
) -> Option<Sphericity> {
    let p = contrasts.ncols();
    let n = scores.nrows();
    if p < 2 || n <= n_groups {
        return None;
    }
    let d = n - n_groups;

    let z = scores * contrasts;

    let mut means = DMatrix::<f64>::zeros(n_groups, p);
    let mut counts = vec![0usize; n_groups];
    for (s, &g) in groups.iter().enumerate() {
        counts[g] += 1;
        for c in 0..p {
            means[(g, c)] += z[(s, c)];
        }
    }
    for (g, &count) in counts.iter().enumerate() {
        for c in 0..p {
            means[(g, c)] /= count.max(1) as f64;
        }
    }

    let centered = DMatrix::from_fn(n, p, |s, c| z[(s, c)] - means[(groups[s], c)]);
    let cov = centered.transpose() * &centered / d as f64;

    let scale = z.iter().map(|v| v * v).sum::<f64>() / n as f64;
    let trace = cov.trace();
    if !(trace > 1e-12 * scale) {
        return None;
    }

    let pf = p as f64;
    let df = d as f64;
    let trace_sq: f64 = cov.iter().map(|v| v * v).sum();
    let gg_epsilon = (trace * trace / (pf * trace_sq)).clamp(1.0 / pf, 1.0);

    let hf_denominator = pf * (df - pf * gg_epsilon);
    let hf_epsilon = if hf_denominator > 0.0 {
        (((df + 1.0) * pf * gg_epsilon - 2.0) / hf_denominator).min(1.0)
    } else {
        1.0
    };

    let (mauchly_w, mauchly_p) = mauchly(&cov, p, d, trace);

    Some(Sphericity {
        mauchly_w,
        mauchly_p,
        gg_epsilon,
        hf_epsilon,
        corrected_p_value: f64::NAN,
        applied: false,
    })
}

/// Mauchly's W and its p-value with the second-order chi-square correction.
fn mauchly(cov: &DMatrix<f64>, p: usize, d: usize, trace: f64) -> (f64, f64) {
    if d < p {
        return (f64::NAN, f64::NAN);
    }
    let pf = p as f64;
    let df = d as f64;

    let log_det = match Cholesky::new(cov.clone()) {
        Some(chol) => 2.0 * chol.l().diagonal().iter().map(|v| v.ln()).sum::<f64>(),
        // Singular covariance: W = 0, sphericity maximally violated
        None => return (0.0, 0.0),
    };
    let log_w = log_det - pf * (trace / pf).ln();

    let rho = 1.0 - (2.0 * pf * pf + pf + 2.0) / (6.0 * pf * df);
    let w2 = (pf + 2.0) * (pf - 1.0) * (pf - 2.0) * (2.0 * pf.powi(3) + 6.0 * pf * pf + 3.0 * pf + 2.0)
        / (288.0 * (df * pf * rho).powi(2));
    let z = -df * rho * log_w;
    let f = pf * (pf + 1.0) / 2.0 - 1.0;
    let pr1 = chi_squared_upper_tail(z, f);
    let pr2 = chi_squared_upper_tail(z, f + 4.0);
    let p_value = (pr1 + w2 * (pr2 - pr1)).clamp(0.0, 1.0);

    (log_w.exp().min(1.0), p_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helmert_orthonormal() {
        for k in 2..6 {
            let c = helmert(k);
            let gram = c.transpose() * &c;
            for i in 0..k - 1 {
                for j in 0..k - 1 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!((gram[(i, j)] - expected).abs() < 1e-12);
                }
                assert!(c.column(i).sum().abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_compound_symmetry_is_spherical() {
        // Subject offset plus independent, equal-variance noise per level
        let offsets = [0.0, 3.0, -2.0, 5.0, 1.0, -4.0];
        let noise = [
            [1.0, -1.0, 0.0],
            [-1.0, 0.0, 1.0],
            [0.0, 1.0, -1.0],
            [1.0, 0.0, -1.0],
            [-1.0, 1.0, 0.0],
            [0.0, -1.0, 1.0],
        ];
        let scores = DMatrix::from_fn(6, 3, |s, t| offsets[s] + noise[s][t]);
        let result = assess(&scores, &[0; 6], 1, &helmert(3)).unwrap();
        assert!(result.gg_epsilon > 0.9);
        assert!(result.hf_epsilon <= 1.0);
        assert!(result.mauchly_p > 0.05);
    }

    #[test]
    fn test_single_contrast_skipped() {
        let scores = DMatrix::from_fn(4, 2, |s, t| (s * 2 + t) as f64);
        assert!(assess(&scores, &[0; 4], 1, &helmert(2)).is_none());
    }

    #[test]
    fn test_epsilon_bounds() {
        // One contrast carries all variance: maximal departure
        let scores = DMatrix::from_fn(8, 3, |s, t| if t == 2 { (s * s) as f64 } else { 0.0 });
        let result = assess(&scores, &[0; 8], 1, &helmert(3)).unwrap();
        assert!(result.gg_epsilon >= 0.5 - 1e-12);
        assert!(result.gg_epsilon <= 1.0);
    }
}
