//! Sample moments.

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sum of squared deviations from the sample mean.
///
/// Uses a two-pass computation; the samples here are small enough that the
/// extra pass costs nothing and it avoids cancellation.
pub fn sum_squared_deviations(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m) * (x - m)).sum()
}

/// Unbiased sample variance (n − 1 denominator). NaN when n < 2.
pub fn variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    sum_squared_deviations(data) / (data.len() - 1) as f64
}
