//! One observation inflated to a hundred times its group mean.

use twoway::twoway_core::{Severity, TestOutcome};
use twoway::{
    run, AnalysisError, AssumptionViolation, Error, OutlierPolicy, PipelineConfig, Source,
};

use crate::common::{factorial, BASE, NOISE};

/// Placebo at time 0 holds [8, 9, 10, 11, 12]; the last becomes 1000.
fn with_outlier() -> twoway::Dataset {
    factorial(5, false, |c, t, k| {
        if c == 0 && t == 0 && k == 4 {
            1000.0
        } else {
            let shift = if c == 1 && t > 0 { 5.0 } else { 0.0 };
            BASE[t] + shift + NOISE[k][t]
        }
    })
}

#[test]
fn outlier_flagged_extreme_and_breaks_normality() {
    let report = run(&with_outlier(), &PipelineConfig::default()).unwrap();

    let group = &report.outliers[0];
    assert_eq!((group.condition.as_str(), group.time.as_str()), ("placebo", "0"));
    assert_eq!(group.n_extreme(), 1);
    assert_eq!(group.outliers[0].value, 1000.0);
    assert_eq!(group.outliers[0].subject, "placebo-4");
    assert_eq!(group.outliers[0].severity, Severity::Extreme);
    let others: usize = report.outliers[1..].iter().map(|g| g.n_extreme()).sum();
    assert_eq!(others, 0);

    match &report.normality[0].outcome {
        TestOutcome::Tested(sw) => {
            assert!(sw.p_value < 0.05);
            assert!((sw.statistic - 0.5547).abs() < 1e-3);
        }
        other => panic!("expected a tested outcome, got {:?}", other),
    }

    // Retained: the ANOVA still runs on all 40 observations
    assert_eq!(report.n_analysed(), 40);
    assert!(report.excluded.is_empty());
}

#[test]
fn violations_reported_alongside_results() {
    let report = run(&with_outlier(), &PipelineConfig::default()).unwrap();
    let violations = report.assumption_violations(0.05);

    assert!(violations.iter().any(|v| matches!(
        v,
        AssumptionViolation::NonNormal { condition, time, .. } if condition == "placebo" && time == "0"
    )));
    assert!(violations
        .iter()
        .any(|v| matches!(v, AssumptionViolation::UnequalVariances { .. })));
    assert!(violations.iter().any(|v| matches!(
        v,
        AssumptionViolation::ExtremeOutlier { subject, .. } if subject == "placebo-4"
    )));
    assert!(report.anova.row(Source::ConditionTime).is_some());
}

#[test]
fn exclusion_removes_only_the_extreme_value() {
    let config = PipelineConfig::new().with_outlier_policy(OutlierPolicy::ExcludeExtreme);
    let report = run(&with_outlier(), &config).unwrap();

    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].value, 1000.0);
    assert_eq!(report.n_analysed(), 39);
    assert_eq!(report.summaries[0].n, 4);
    assert!(!report.warnings.is_empty());
    assert!(!report.anova.balanced);
    // The screen itself still describes the input
    assert_eq!(report.outliers[0].n_extreme(), 1);
}

#[test]
fn exclusion_under_repeated_measures_is_not_silent() {
    let config = PipelineConfig::new()
        .with_outlier_policy(OutlierPolicy::ExcludeExtreme)
        .with_repeated_measures(true);
    let err = run(&with_outlier(), &config).unwrap_err();

    match err {
        Error::Analysis(AnalysisError::MissingRepeatedMeasure {
            subject,
            condition,
            time,
        }) => {
            assert_eq!(subject, "placebo-4");
            assert_eq!(condition, "placebo");
            assert_eq!(time, "0");
        }
        other => panic!("expected MissingRepeatedMeasure, got {:?}", other),
    }
}
