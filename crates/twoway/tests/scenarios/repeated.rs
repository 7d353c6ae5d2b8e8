//! Repeated-measures designs end to end, including CSV ingestion.

use std::io::Write;

use twoway::{
    analyze_file, run, AnalysisError, AnovaMode, Dataset, Design, Error, ErrorTermSource, Factor,
    Observation, PipelineConfig, Source, SphericityCorrection,
};

use crate::common::{diverging, factorial, to_csv, NOISE};

/// Every subject under both conditions, with condition-specific noise so the
/// Condition × Subject stratum is not empty.
fn crossed() -> Dataset {
    factorial(5, true, |c, t, k| {
        let extra = if c == 1 {
            0.5 * NOISE[(k + 1) % 5][(t + 2) % 4]
        } else {
            0.0
        };
        10.0 + t as f64 + 2.0 * c as f64 + NOISE[k][t] + extra
    })
}

#[test]
fn within_design_uses_subject_strata() {
    let ds = crossed();
    assert_eq!(ds.design(), Design::WithinSubjects);

    let config = PipelineConfig::new().with_repeated_measures(true);
    let report = run(&ds, &config).unwrap();

    assert_eq!(report.design, Design::WithinSubjects);
    assert_eq!(report.anova.mode, AnovaMode::Within);
    assert_eq!(report.anova.n_subjects, Some(5));
    assert!(report.anova.partition_holds(1e-9));
    assert_eq!(
        report.anova.row(Source::Condition).unwrap().error_term,
        Some(Source::ConditionSubject)
    );
    assert_eq!(
        report.anova.row(Source::ConditionTime).unwrap().error_term,
        Some(Source::Residual)
    );
    assert!(report.anova.row(Source::Condition).unwrap().is_significant(0.05));
}

#[test]
fn stratified_error_follows_the_design() {
    let ds = crossed();
    let base = PipelineConfig::new().with_repeated_measures(true);
    let full = run(&ds, &base.clone()).unwrap();
    let stratified = run(&ds, &base.with_error_term(ErrorTermSource::Stratified)).unwrap();

    assert_eq!(full.posthoc.error, full.anova.full_model_residual);
    assert_eq!(stratified.posthoc.error, stratified.anova.within_time_error);
    // Same estimates, different standard errors
    for (a, b) in full.posthoc.contrasts.iter().zip(&stratified.posthoc.contrasts) {
        assert_eq!(a.estimate, b.estimate);
        assert_eq!(a.df, full.anova.full_model_residual.df);
        assert_eq!(b.df, stratified.anova.within_time_error.df);
    }
}

#[test]
fn sphericity_policy_controls_reported_p() {
    let ds = diverging(5.0, false);
    let always = PipelineConfig::new()
        .with_repeated_measures(true)
        .with_sphericity(SphericityCorrection::GreenhouseGeisser);
    let never = always.clone().with_sphericity(SphericityCorrection::None);

    let corrected = run(&ds, &always).unwrap();
    let uncorrected = run(&ds, &never).unwrap();

    let c = corrected.anova.row(Source::Time).unwrap();
    let u = uncorrected.anova.row(Source::Time).unwrap();
    assert_eq!(c.f, u.f);
    assert!(c.sphericity.unwrap().applied);
    assert!(!u.sphericity.unwrap().applied);
    assert!(c.reported_p_value().unwrap() >= u.reported_p_value().unwrap());
}

#[test]
fn missing_measure_aborts_repeated_mode_only() {
    let conditions = Factor::new("condition", ["a", "b"]).unwrap();
    let times = Factor::new("time", ["1", "2", "3"]).unwrap();
    let mut observations = Vec::new();
    for (subject, c) in [("s1", 0), ("s2", 0), ("s3", 0), ("s4", 1), ("s5", 1), ("s6", 1)] {
        for t in 0..3 {
            if subject == "s5" && t == 2 {
                continue;
            }
            let value = 5.0 + t as f64 + c as f64 + subject.as_bytes()[1] as f64 * 0.1;
            observations.push(Observation::new(subject, c, t, value + (t * c) as f64 * 0.3));
        }
    }
    let ds = Dataset::new(conditions, times, observations).unwrap();

    assert!(run(&ds, &PipelineConfig::default()).is_ok());

    let err = run(&ds, &PipelineConfig::new().with_repeated_measures(true)).unwrap_err();
    match err {
        Error::Analysis(AnalysisError::MissingRepeatedMeasure {
            subject,
            condition,
            time,
        }) => {
            assert_eq!(subject, "s5");
            assert_eq!(condition, "b");
            assert_eq!(time, "3");
        }
        other => panic!("expected MissingRepeatedMeasure, got {:?}", other),
    }
}

#[test]
fn csv_file_matches_in_memory_run() {
    let ds = diverging(5.0, false);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", to_csv(&ds)).unwrap();
    file.flush().unwrap();

    let config = PipelineConfig::new().with_repeated_measures(true);
    let from_file = analyze_file(file.path(), &config).unwrap();
    let in_memory = run(&ds, &config).unwrap();

    assert_eq!(from_file.anova.mode, AnovaMode::Mixed);
    assert_eq!(from_file.anova.rows.len(), in_memory.anova.rows.len());
    for (a, b) in from_file.anova.rows.iter().zip(&in_memory.anova.rows) {
        assert_eq!(a.source, b.source);
        assert!((a.ss - b.ss).abs() < 1e-9);
    }
    assert_eq!(from_file.posthoc.len(), in_memory.posthoc.len());
}
