//! Shared fixtures for the integration tests.

#![allow(dead_code, unused_imports)]

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

use twoway::Dataset;

pub use twoway_core::testing::{
    diverging, factorial, swap_conditions, BASE, CONDITIONS, NOISE, TIMES,
};

/// Seeded normal data with a condition effect growing over time.
pub fn seeded(seed: u64, n: usize, crossed: bool, effect: f64) -> Dataset {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    let subject_effect = Normal::new(0.0, 3.0).unwrap();
    let offsets: Vec<f64> = (0..2 * n).map(|_| subject_effect.sample(&mut rng)).collect();
    let errors: Vec<f64> = (0..2 * n * 4).map(|_| noise.sample(&mut rng)).collect();

    factorial(n, crossed, |c, t, k| {
        let s = if crossed { k } else { c * n + k };
        50.0 + 2.0 * t as f64
            + effect * (c * t) as f64
            + offsets[s]
            + errors[(c * n + k) * 4 + t]
    })
}

/// Render a dataset as long-format CSV with the default column names.
pub fn to_csv(dataset: &Dataset) -> String {
    let mut out = String::from("id,condition,time,value\n");
    for o in dataset.observations() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            o.subject,
            dataset.conditions().label(o.condition),
            dataset.times().label(o.time),
            o.value
        ));
    }
    out
}
