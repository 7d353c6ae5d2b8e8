//! Report contents, small-sample handling and output formats.

use twoway::output::{format_report, to_json, write_csv};
use twoway::twoway_core::{IndeterminateReason, TestOutcome};
use twoway::{run, AssumptionViolation, PipelineConfig};

use crate::common::{diverging, factorial, BASE, NOISE};

#[test]
fn small_groups_are_indeterminate_not_fatal() {
    let ds = factorial(2, false, |c, t, k| BASE[t] + c as f64 + NOISE[k][t]);
    let report = run(&ds, &PipelineConfig::default()).unwrap();

    assert_eq!(report.normality.len(), 8);
    for group in &report.normality {
        assert_eq!(
            group.outcome,
            TestOutcome::Indeterminate(IndeterminateReason::InsufficientData {
                required: 3,
                got: 2
            })
        );
    }
    assert!(report.homogeneity.tested().is_some());
    assert!(report
        .assumption_violations(0.05)
        .iter()
        .all(|v| !matches!(v, AssumptionViolation::NonNormal { .. })));
    assert_eq!(report.anova.row(twoway::Source::Residual).unwrap().df, 8);
}

#[test]
fn summaries_describe_every_cell() {
    let report = run(&diverging(5.0, false), &PipelineConfig::default()).unwrap();

    assert_eq!(report.summaries.len(), 8);
    let first = &report.summaries[0];
    assert_eq!((first.condition.as_str(), first.time.as_str()), ("placebo", "0"));
    assert_eq!(first.n, 5);
    assert!((first.mean - 10.0).abs() < 1e-12);
    assert!((first.median - 10.0).abs() < 1e-12);
    assert!((first.sd - 2.5f64.sqrt()).abs() < 1e-12);

    let last = &report.summaries[7];
    assert_eq!((last.condition.as_str(), last.time.as_str()), ("ketone", "90"));
    assert!((last.mean - 18.0).abs() < 1e-12);
}

#[test]
fn clean_data_has_no_violations() {
    let report = run(&diverging(5.0, false), &PipelineConfig::default()).unwrap();
    assert!(report.excluded.is_empty());
    assert!(report.warnings.is_empty());
    assert!(report.homogeneity.tested().is_some_and(|b| !b.violates(0.05)));
    assert!(format_report(&report).contains("No assumption violations detected"));
}

#[test]
fn outputs_cover_every_table() {
    let report = run(&diverging(5.0, false), &PipelineConfig::default()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
    assert_eq!(json["posthoc"]["contrasts"][1]["first"], "placebo");
    assert_eq!(json["posthoc"]["contrasts"][1]["significant"], true);

    let mut summaries = Vec::new();
    write_csv(&mut summaries, report.summaries.as_slice()).unwrap();
    assert_eq!(String::from_utf8(summaries).unwrap().lines().count(), 9);

    let mut normality = Vec::new();
    write_csv(&mut normality, report.normality.as_slice()).unwrap();
    assert_eq!(String::from_utf8(normality).unwrap().lines().count(), 9);

    let mut outliers = Vec::new();
    write_csv(&mut outliers, report.outliers.as_slice()).unwrap();
    assert_eq!(
        String::from_utf8(outliers).unwrap().lines().next(),
        Some("condition,time,subject,value,severity")
    );
}
