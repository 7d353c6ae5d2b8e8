//! Shared result wrappers for tests that may not be computable.

use serde::{Deserialize, Serialize};

/// Why a test produced no statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndeterminateReason {
    /// A sample is smaller than the test supports.
    InsufficientData {
        /// Minimum sample size the test needs.
        required: usize,
        /// Size actually available.
        got: usize,
    },

    /// A sample is larger than the test's approximation covers.
    TooManyObservations {
        /// Largest supported sample size.
        max: usize,
        /// Size actually available.
        got: usize,
    },

    /// All values in a sample are identical.
    ZeroRange,

    /// At least one sample has zero variance (log of zero in Bartlett's statistic).
    ZeroVariance,

    /// The test compares groups and fewer than two were supplied.
    TooFewGroups {
        /// Number of groups supplied.
        got: usize,
    },
}

impl std::fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { required, got } => {
                write!(f, "insufficient data (n = {}, need at least {})", got, required)
            }
            Self::TooManyObservations { max, got } => {
                write!(f, "too many observations (n = {}, at most {})", got, max)
            }
            Self::ZeroRange => write!(f, "all values identical"),
            Self::ZeroVariance => write!(f, "a group has zero variance"),
            Self::TooFewGroups { got } => write!(f, "need at least 2 groups, got {}", got),
        }
    }
}

/// Outcome of a statistical test that may be indeterminate.
///
/// Assumption tests never fail the analysis: when the data cannot support
/// the test the outcome carries the reason instead of a statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestOutcome<T> {
    /// The test ran.
    Tested(T),
    /// The test could not run on this data.
    Indeterminate(IndeterminateReason),
}

impl<T> TestOutcome<T> {
    /// The computed result, if any.
    pub fn tested(&self) -> Option<&T> {
        match self {
            Self::Tested(t) => Some(t),
            Self::Indeterminate(_) => None,
        }
    }

    /// Check if the test could not run.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate(_))
    }
}
