//! Both conditions carry exactly the same values at every time.

use twoway::{run, PipelineConfig, Source};

use crate::common::{factorial, BASE, NOISE};

fn identical(crossed: bool) -> twoway::Dataset {
    factorial(5, crossed, |_, t, k| BASE[t] + NOISE[k][t])
}

#[test]
fn condition_effects_vanish() {
    let report = run(&identical(false), &PipelineConfig::default()).unwrap();

    for source in [Source::Condition, Source::ConditionTime] {
        let row = report.anova.row(source).unwrap();
        assert!(row.f.unwrap().abs() < 1e-12, "{}", source);
        assert!(row.p_value.unwrap() > 0.999, "{}", source);
    }
    assert!(report.anova.row(Source::Time).unwrap().p_value.unwrap() < 0.05);
    assert_eq!(report.significant_effects(), [Source::Time]);
}

#[test]
fn no_contrast_significant() {
    for repeated in [false, true] {
        let config = PipelineConfig::new().with_repeated_measures(repeated);
        let report = run(&identical(false), &config).unwrap();

        assert_eq!(report.posthoc.len(), 4);
        for c in &report.posthoc.contrasts {
            assert_eq!(c.estimate, 0.0);
            assert_eq!(c.adjusted_p_value, 1.0);
            assert!(!c.significant);
        }
        assert_eq!(report.posthoc.significant().count(), 0);
    }
}
