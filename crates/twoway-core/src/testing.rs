//! Deterministic fixtures shared by the unit and integration tests.
//!
//! Compiled for this crate's tests and behind the `fixtures` feature.

use crate::dataset::{Dataset, Factor, Observation};

/// Condition levels of the fixtures.
pub const CONDITIONS: [&str; 2] = ["placebo", "ketone"];
/// Time levels of the fixtures.
pub const TIMES: [&str; 4] = ["0", "30", "60", "90"];

/// Mean outcome per time before any condition effect.
pub const BASE: [f64; 4] = [10.0, 12.0, 14.0, 13.0];

/// Subject × time deviations; every column sums to zero and the table is
/// not additive, so subject strata keep a non-zero residual.
pub const NOISE: [[f64; 4]; 5] = [
    [-2.0, -1.0, -2.5, -1.5],
    [-1.0, 0.5, -0.5, -1.0],
    [0.0, -0.5, 1.0, 0.5],
    [1.0, 2.0, 0.5, 0.0],
    [2.0, -1.0, 1.5, 2.0],
];

/// Subject identifier for replicate `k` of condition `c`.
pub fn subject(c: usize, k: usize, crossed: bool) -> String {
    if crossed {
        format!("s{}", k)
    } else {
        format!("{}-{}", CONDITIONS[c], k)
    }
}

/// A 2 × 4 dataset with `n` subjects per cell.
///
/// `crossed` puts every subject under both conditions (within design);
/// otherwise each subject belongs to one condition (mixed design).
/// `value(condition, time, replicate)` gives the outcome.
pub fn factorial(n: usize, crossed: bool, value: impl Fn(usize, usize, usize) -> f64) -> Dataset {
    let conditions = Factor::new("condition", CONDITIONS).unwrap();
    let times = Factor::new("time", TIMES).unwrap();
    let mut observations = Vec::new();
    for c in 0..CONDITIONS.len() {
        for k in 0..n {
            for t in 0..TIMES.len() {
                observations.push(Observation::new(subject(c, k, crossed), c, t, value(c, t, k)));
            }
        }
    }
    Dataset::new(conditions, times, observations).unwrap()
}

/// Equal condition means at the first time, `offset` apart at the other three.
pub fn diverging(offset: f64, crossed: bool) -> Dataset {
    factorial(5, crossed, |c, t, k| {
        let shift = if c == 1 && t > 0 { offset } else { 0.0 };
        BASE[t] + shift + NOISE[k][t]
    })
}

/// Same observations with the condition levels declared in reverse order.
pub fn swap_conditions(dataset: &Dataset) -> Dataset {
    let mut levels: Vec<String> = dataset.conditions().levels().to_vec();
    levels.reverse();
    let conditions = Factor::new("condition", levels).unwrap();
    let last = dataset.conditions().len() - 1;
    let observations = dataset
        .observations()
        .iter()
        .map(|o| Observation::new(o.subject.clone(), last - o.condition, o.time, o.value))
        .collect();
    Dataset::new(conditions, dataset.times().clone(), observations).unwrap()
}
