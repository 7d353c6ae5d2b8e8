//! Condition means equal at the first time and diverging afterwards.

use twoway::{run, AnovaMode, ErrorTermSource, PipelineConfig, Source};

use crate::common::{diverging, swap_conditions, TIMES};

#[test]
fn interaction_detected_between_subjects() {
    let report = run(&diverging(5.0, false), &PipelineConfig::default()).unwrap();

    assert_eq!(report.anova.mode, AnovaMode::BetweenSubjects);
    let interaction = report.anova.row(Source::ConditionTime).unwrap();
    assert!((interaction.f.unwrap() - 7.352941).abs() < 1e-5);
    assert!(interaction.p_value.unwrap() < 0.05);
    assert!(report.anova.partition_holds(1e-9));
    assert!(report.significant_effects().contains(&Source::ConditionTime));
}

#[test]
fn contrasts_significant_only_after_divergence() {
    let report = run(&diverging(5.0, false), &PipelineConfig::default()).unwrap();
    let posthoc = &report.posthoc;

    assert_eq!(posthoc.len(), TIMES.len());
    assert_eq!(posthoc.nmeans, 8);
    let levels: Vec<&str> = posthoc.contrasts.iter().map(|c| c.level.as_str()).collect();
    assert_eq!(levels, TIMES);

    let first = &posthoc.contrasts[0];
    assert_eq!(first.estimate, 0.0);
    assert_eq!(first.adjusted_p_value, 1.0);
    assert!(!first.significant);

    for c in &posthoc.contrasts[1..] {
        assert!((c.estimate + 5.0).abs() < 1e-12, "time {}", c.level);
        assert!((c.se - (2.125f64 * 0.4).sqrt()).abs() < 1e-12);
        assert!(c.significant, "time {}", c.level);
        assert!(c.adjusted_p_value >= c.p_value);
        assert!(c.ci_upper < 0.0);
    }
}

#[test]
fn mixed_mode_keeps_conclusions() {
    for error_term in [ErrorTermSource::FullModelResidual, ErrorTermSource::Stratified] {
        let config = PipelineConfig::new()
            .with_repeated_measures(true)
            .with_error_term(error_term);
        let report = run(&diverging(5.0, false), &config).unwrap();

        assert_eq!(report.anova.mode, AnovaMode::Mixed);
        let interaction = report.anova.row(Source::ConditionTime).unwrap();
        assert!((interaction.f.unwrap() - 15.151515).abs() < 1e-5);
        assert!(interaction.reported_p_value().unwrap() < 0.05);

        let flags: Vec<bool> = report.posthoc.contrasts.iter().map(|c| c.significant).collect();
        assert_eq!(flags, [false, true, true, true], "{}", error_term);
    }
}

#[test]
fn stratified_error_uses_pooled_within_time_term() {
    let config = PipelineConfig::new()
        .with_repeated_measures(true)
        .with_error_term(ErrorTermSource::Stratified);
    let report = run(&diverging(5.0, false), &config).unwrap();

    assert!((report.posthoc.error.ms - 2.125).abs() < 1e-12);
    assert!((report.posthoc.error.df - 17.8296).abs() < 1e-3);
    assert_eq!(report.posthoc.error_source, ErrorTermSource::Stratified);
}

#[test]
fn swapped_condition_order_flips_estimates_only() {
    let ds = diverging(5.0, false);
    let original = run(&ds, &PipelineConfig::default()).unwrap();
    let swapped = run(&swap_conditions(&ds), &PipelineConfig::default()).unwrap();

    for (a, b) in original.anova.rows.iter().zip(&swapped.anova.rows) {
        assert_eq!(a.source, b.source);
        if let (Some(fa), Some(fb)) = (a.f, b.f) {
            assert!((fa - fb).abs() < 1e-9 * fa.max(1.0));
        }
        if let (Some(pa), Some(pb)) = (a.p_value, b.p_value) {
            assert!((pa - pb).abs() < 1e-9);
        }
    }
    for (a, b) in original.posthoc.contrasts.iter().zip(&swapped.posthoc.contrasts) {
        assert_eq!((a.first.as_str(), a.second.as_str()), ("placebo", "ketone"));
        assert_eq!((b.first.as_str(), b.second.as_str()), ("ketone", "placebo"));
        assert!((a.estimate + b.estimate).abs() < 1e-12);
        assert!((a.adjusted_p_value - b.adjusted_p_value).abs() < 1e-9);
    }
}
