//! Pipeline-level properties on seeded random data.

use proptest::prelude::*;

use twoway::twoway_core::outliers::Fences;
use twoway::{run, AnovaMode, ErrorTermSource, PipelineConfig};

use crate::common::{seeded, swap_conditions, TIMES};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every mode partitions the total sum of squares and keeps the
    /// Tukey family ordered by time with adjusted p at least the raw p.
    #[test]
    fn prop_report_invariants(
        seed in any::<u64>(),
        n in 3usize..7,
        crossed in any::<bool>(),
        repeated in any::<bool>(),
        effect in 0.0f64..3.0,
    ) {
        let ds = seeded(seed, n, crossed, effect);
        let config = PipelineConfig::new()
            .with_repeated_measures(repeated)
            .with_error_term(ErrorTermSource::Stratified);
        let report = run(&ds, &config).unwrap();

        let expected_mode = match (repeated, crossed) {
            (false, _) => AnovaMode::BetweenSubjects,
            (true, false) => AnovaMode::Mixed,
            (true, true) => AnovaMode::Within,
        };
        prop_assert_eq!(report.anova.mode, expected_mode);
        prop_assert!(report.anova.partition_holds(1e-6));

        let levels: Vec<&str> = report.posthoc.contrasts.iter().map(|c| c.level.as_str()).collect();
        prop_assert_eq!(levels, TIMES.to_vec());
        for c in &report.posthoc.contrasts {
            prop_assert!(c.adjusted_p_value >= c.p_value - 1e-9);
            prop_assert!(c.ci_lower <= c.estimate && c.estimate <= c.ci_upper);
        }

        for g in &report.outliers {
            prop_assert!(g.fences.extreme_lower <= g.fences.mild_lower);
            prop_assert!(g.fences.mild_upper <= g.fences.extreme_upper);
        }
    }

    /// Declaring the conditions in the other order changes no F or p.
    #[test]
    fn prop_condition_order_invariance(seed in any::<u64>(), repeated in any::<bool>()) {
        let ds = seeded(seed, 4, false, 1.0);
        let config = PipelineConfig::new().with_repeated_measures(repeated);
        let a = run(&ds, &config).unwrap();
        let b = run(&swap_conditions(&ds), &config).unwrap();

        for (ra, rb) in a.anova.rows.iter().zip(&b.anova.rows) {
            if let (Some(fa), Some(fb)) = (ra.f, rb.f) {
                prop_assert!((fa - fb).abs() <= 1e-7 * fa.abs().max(1.0));
            }
            if let (Some(pa), Some(pb)) = (ra.reported_p_value(), rb.reported_p_value()) {
                prop_assert!((pa - pb).abs() <= 1e-7);
            }
        }
        for (ca, cb) in a.posthoc.contrasts.iter().zip(&b.posthoc.contrasts) {
            prop_assert!((ca.estimate + cb.estimate).abs() <= 1e-9);
        }
    }
}

#[test]
fn fences_nest_on_constant_data() {
    let fences = Fences::from_values(&[3.0; 6]);
    assert_eq!(fences.classify(3.0), None);
    assert!(fences.classify(3.5).is_some());
}
