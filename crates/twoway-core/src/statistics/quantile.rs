//! Quantile computation using Type 7 quantiles (linear interpolation of order statistics).
//!
//! This module implements the Type 7 definition from Hyndman & Fan (1996),
//! the classic interpolated estimator used for boxplot fences.
//!
//! **Type 7 formula** (for sorted sample x of size n at probability p, 0-based):
//! ```text
//! h = (n - 1) * p
//! q = x[floor(h)] + (h - floor(h)) * (x[ceil(h)] - x[floor(h)])
//! ```
//!
//! # Input Requirements
//!
//! All input data must be finite (no NaN or infinity values). In debug builds,
//! this is checked via assertions. Datasets reject non-finite values at
//! construction, so the analysis stages never see them.
//!
//! # Reference
//!
//! Hyndman, R. J. & Fan, Y. (1996). "Sample quantiles in statistical packages."
//! The American Statistician 50(4):361–365.

use serde::{Deserialize, Serialize};

/// Debug assertion that all values in the slice are finite.
#[inline]
fn debug_assert_finite(data: &[f64]) {
    debug_assert!(
        data.iter().all(|x| x.is_finite()),
        "quantile input must be finite (no NaN or infinity)"
    );
}

/// Return a sorted copy of the data (ascending, total order).
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Compute a Type 7 quantile of already-sorted data.
///
/// # Panics
///
/// Panics if `sorted` is empty or if `p` is outside [0, 1].
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );
    debug_assert_finite(sorted);

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (h.ceil() as usize).min(n - 1);
    let frac = h - lo as f64;

    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Compute a Type 7 quantile of unsorted data.
///
/// The input is copied and sorted; callers needing several quantiles of the
/// same sample should sort once and use [`quantile_sorted`].
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 1].
pub fn quantile(data: &[f64], p: f64) -> f64 {
    quantile_sorted(&sorted(data), p)
}

/// First quartile, median and third quartile of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    /// 25th percentile.
    pub q1: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub q3: f64,
}

impl Quartiles {
    /// Interquartile range (Q3 − Q1).
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Compute Q1, median and Q3 with a single sort.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn quartiles(data: &[f64]) -> Quartiles {
    let s = sorted(data);
    Quartiles {
        q1: quantile_sorted(&s, 0.25),
        median: quantile_sorted(&s, 0.5),
        q3: quantile_sorted(&s, 0.75),
    }
}
