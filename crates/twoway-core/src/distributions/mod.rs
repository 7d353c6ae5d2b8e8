//! Tail probabilities of the reference distributions used by the tests.
//!
//! F, chi-square, Student t and normal tails come from `statrs`. The
//! studentized range distribution is not available there and is implemented
//! numerically in [`tukey`].
//!
//! All functions return NaN rather than panicking when parameters are outside
//! their support, so a degenerate table row propagates as "no p-value"
//! instead of aborting the analysis.

pub mod tukey;

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

pub use tukey::{ptukey, qtukey};

/// Upper-tail probability P(F > f) of the F distribution with (df1, df2).
///
/// Non-integer degrees of freedom are accepted (sphericity-corrected tests).
pub fn f_upper_tail(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || !(df1 > 0.0) || !(df2 > 0.0) {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => dist.sf(f).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail probability P(X > x) of the chi-square distribution.
pub fn chi_squared_upper_tail(x: f64, df: f64) -> f64 {
    if x.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    match ChiSquared::new(df) {
        Ok(dist) => dist.sf(x).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value P(|T| > |t|) of Student's t with `df` degrees of freedom.
///
/// An infinite `df` falls back to the standard normal.
pub fn t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }
    let t = t.abs();
    if t.is_infinite() {
        return 0.0;
    }
    if df.is_infinite() {
        return (2.0 * normal_sf(t)).min(1.0);
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t)).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-x * std::f64::consts::FRAC_1_SQRT_2)
}

/// Standard normal upper tail, accurate far into the tail.
pub fn normal_sf(x: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(x * std::f64::consts::FRAC_1_SQRT_2)
}

/// Standard normal quantile.
///
/// Returns NaN for `p` outside (0, 1).
pub fn normal_quantile(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => dist.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}
