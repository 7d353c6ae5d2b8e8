//! Constants shared across the analysis stages.

/// Default significance threshold used when annotating results.
///
/// The engines only report p-values; this threshold is applied by callers
/// (and by the `Auto` sphericity policy).
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default confidence level for post-hoc intervals.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

// =============================================================================
// Outlier screen
// =============================================================================

/// IQR multiplier for the mild-outlier fence.
pub const MILD_FENCE_MULTIPLIER: f64 = 1.5;

/// IQR multiplier for the extreme-outlier fence.
pub const EXTREME_FENCE_MULTIPLIER: f64 = 3.0;

// =============================================================================
// Assumption tests
// =============================================================================

/// Smallest sample the Shapiro-Wilk test supports.
pub const SHAPIRO_MIN_N: usize = 3;

/// Largest sample the Royston approximation is calibrated for.
pub const SHAPIRO_MAX_N: usize = 5000;

/// Smallest per-group sample size Bartlett's test accepts.
pub const BARTLETT_MIN_N: usize = 2;

/// Ranges below this are treated as constant data.
pub const ZERO_RANGE: f64 = 1e-10;

// =============================================================================
// ANOVA
// =============================================================================

/// Relative tolerance for the sum-of-squares partition identity.
pub const SS_PARTITION_TOLERANCE: f64 = 1e-6;
