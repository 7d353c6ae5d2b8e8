//! Descriptive statistics used by every analysis stage.
//!
//! - **Quantiles** (`quantile`): Type 7 interpolated order statistics
//! - **Moments** (`descriptive`): mean, variance, sum of squared deviations

mod descriptive;
mod quantile;

pub use descriptive::{mean, sum_squared_deviations, variance};
pub use quantile::{quantile, quantile_sorted, quartiles, sorted, Quartiles};
