//! The analysis sequence.
//!
//! Stages run strictly in order, each on the completed output of the one
//! before:
//!
//! 1. Outlier screen of the input (boxplot rule per cell)
//! 2. Outlier policy: optionally drop extreme outliers
//! 3. Shapiro-Wilk per cell and Bartlett across cells
//! 4. Two-way ANOVA, stratified by subject in repeated-measures mode
//! 5. Tukey-adjusted condition contrasts within each time
//!
//! Assumption violations are logged at `warn` and attached to the report;
//! they never stop the run.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, info, warn};

use twoway_core::outliers::{self, flagged_indices};
use twoway_core::{anova, homogeneity, normality, posthoc};
use twoway_core::{Dataset, FactorKind, GroupOutliers, Outlier, Severity};

use crate::config::{OutlierPolicy, PipelineConfig};
use crate::data::load_long_csv;
use crate::error::Result;
use crate::report::Report;

/// Run every stage on an in-memory dataset.
///
/// # Arguments
///
/// * `dataset` - Validated long-format data
/// * `config` - Analysis choices; validated before anything runs
///
/// # Errors
///
/// - `Config` if the configuration is out of range
/// - `Analysis` for structural problems: `MissingRepeatedMeasure` or
///   `InconsistentSubject` in repeated-measures mode, `DegenerateError` when
///   an error stratum has no degrees of freedom, or `Schema(EmptyCell)` when
///   outlier exclusion empties a cell
pub fn run(dataset: &Dataset, config: &PipelineConfig) -> Result<Report> {
    config.validate()?;

    let design = dataset.design();
    info!(
        observations = dataset.len(),
        conditions = dataset.conditions().len(),
        times = dataset.times().len(),
        %design,
        repeated_measures = config.repeated_measures,
        "starting two-way analysis"
    );

    debug!("screening outliers");
    let screen = outliers::screen(dataset);
    let (analysed, excluded) = apply_outlier_policy(dataset, &screen, config.outlier_policy)?;
    debug!(
        mild = screen.iter().map(GroupOutliers::n_mild).sum::<usize>(),
        extreme = screen.iter().map(GroupOutliers::n_extreme).sum::<usize>(),
        excluded = excluded.len(),
        "outlier screen finished"
    );

    let warnings = analysed.warnings();
    for w in &warnings {
        warn!("{}", w);
    }

    debug!("testing normality and homogeneity of variance");
    let normality = normality::screen(&analysed);
    let groups = analysed.groups();
    let homogeneity = homogeneity::test(&groups);

    debug!("fitting ANOVA");
    let anova = anova::fit_with(&analysed, &config.anova_options())?;
    debug!(mode = %anova.mode, rows = anova.rows.len(), "ANOVA finished");

    debug!(error_term = %config.error_term, "running post-hoc comparisons");
    let posthoc = posthoc::compare(
        &anova,
        &analysed,
        FactorKind::Condition,
        FactorKind::Time,
        &config.posthoc_options(),
    )?;

    let report = Report {
        design,
        warnings,
        excluded,
        summaries: analysed.summaries(),
        outliers: screen,
        normality,
        homogeneity,
        anova,
        posthoc,
        config: config.clone(),
    };

    for violation in report.assumption_violations(config.alpha) {
        warn!("{}", violation);
    }
    info!(
        significant_effects = ?report.significant_effects(),
        significant_contrasts = report.posthoc.significant().count(),
        "analysis finished"
    );

    Ok(report)
}

/// Load a long-format CSV file and run every stage on it.
///
/// Columns and level catalogues come from `config.schema`.
///
/// # Errors
///
/// `Data` if the file cannot be loaded, otherwise as [`run`].
pub fn analyze_file(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<Report> {
    config.validate()?;
    let dataset = load_long_csv(path, &config.schema)?;
    run(&dataset, config)
}

/// The dataset the later stages see, and the observations dropped from it.
fn apply_outlier_policy<'a>(
    dataset: &'a Dataset,
    screen: &[GroupOutliers],
    policy: OutlierPolicy,
) -> Result<(Cow<'a, Dataset>, Vec<Outlier>)> {
    match policy {
        OutlierPolicy::Retain => Ok((Cow::Borrowed(dataset), Vec::new())),
        OutlierPolicy::ExcludeExtreme => {
            let indices = flagged_indices(screen, Severity::Extreme);
            if indices.is_empty() {
                return Ok((Cow::Borrowed(dataset), Vec::new()));
            }

            let mut excluded: Vec<Outlier> = screen
                .iter()
                .flat_map(|g| g.with_severity(Severity::Extreme).cloned())
                .collect();
            excluded.sort_by_key(|o| o.index);
            for o in &excluded {
                warn!(subject = %o.subject, value = o.value, "excluding extreme outlier");
            }

            Ok((Cow::Owned(dataset.without(&indices)?), excluded))
        }
    }
}
