//! Subject-stratified decompositions.
//!
//! Subjects are tabulated into a complete score matrix first; any missing
//! (subject, condition, time) measurement is an error because the strata
//! below assume every subject contributes to every cell it belongs to.

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::dataset::{Dataset, Design};
use crate::distributions::f_upper_tail;
use crate::error::AnalysisError;

use super::between::Margins;
use super::sphericity::{assess, average, helmert};
use super::{
    repeated_mode, AnovaMode, AnovaOptions, AnovaRow, ErrorTerm, Partition, Source,
    SphericityCorrection,
};

/// Complete subject × cell score table.
struct SubjectTable {
    /// Condition of every subject (mixed designs); all zero for within designs.
    groups: Vec<usize>,
    /// Subjects × within-subject cells. Mixed designs have one column per
    /// time level, within designs one per (condition, time) cell,
    /// condition-major.
    scores: DMatrix<f64>,
}

impl SubjectTable {
    fn n_subjects(&self) -> usize {
        self.scores.nrows()
    }
}

fn tabulate(dataset: &Dataset, design: Design) -> Result<SubjectTable, AnalysisError> {
    let a = dataset.conditions().len();
    let b = dataset.times().len();
    let subjects = dataset.subjects();
    let index: HashMap<&str, usize> = subjects.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let within = design == Design::WithinSubjects;
    let width = if within { a * b } else { b };
    let mut scores = DMatrix::from_element(subjects.len(), width, f64::NAN);
    let mut groups = vec![0usize; subjects.len()];

    for obs in dataset.observations() {
        let s = index[obs.subject.as_str()];
        let col = if within {
            obs.condition * b + obs.time
        } else {
            groups[s] = obs.condition;
            obs.time
        };
        scores[(s, col)] = obs.value;
    }

    for (s, subject) in subjects.iter().enumerate() {
        for col in 0..width {
            if scores[(s, col)].is_nan() {
                let (condition, time) = if within {
                    (col / b, col % b)
                } else {
                    (groups[s], col)
                };
                return Err(AnalysisError::MissingRepeatedMeasure {
                    subject: subject.to_string(),
                    condition: dataset.conditions().label(condition).to_string(),
                    time: dataset.times().label(time).to_string(),
                });
            }
        }
    }

    Ok(SubjectTable { groups, scores })
}

/// First subject whose number of conditions differs from the most common count.
fn inconsistent_subject(dataset: &Dataset) -> String {
    let mut conditions: HashMap<&str, Vec<usize>> = HashMap::new();
    for obs in dataset.observations() {
        let seen = conditions.entry(obs.subject.as_str()).or_default();
        if !seen.contains(&obs.condition) {
            seen.push(obs.condition);
        }
    }

    let mut frequency: HashMap<usize, usize> = HashMap::new();
    for c in conditions.values() {
        *frequency.entry(c.len()).or_default() += 1;
    }
    let typical = frequency
        .iter()
        .max_by_key(|(count, freq)| (**freq, **count))
        .map(|(count, _)| *count)
        .unwrap_or(1);

    dataset
        .subjects()
        .into_iter()
        .find(|s| conditions.get(s).map_or(0, Vec::len) != typical)
        .unwrap_or_default()
        .to_string()
}

/// Stratified decomposition for the dataset's design.
pub(super) fn partition(
    dataset: &Dataset,
    margins: &Margins,
    options: &AnovaOptions,
) -> Result<Partition, AnalysisError> {
    let design = dataset.design();
    let Some(mode) = repeated_mode(design) else {
        return Err(AnalysisError::InconsistentSubject {
            subject: inconsistent_subject(dataset),
        });
    };

    let table = tabulate(dataset, design)?;
    let mut partition = match mode {
        AnovaMode::Within => within(margins, &table)?,
        _ => mixed(margins, &table)?,
    };

    apply_sphericity(&mut partition.rows, &table, margins, design, options);
    Ok(partition)
}

/// Mean of every row of a matrix.
fn row_means(m: &DMatrix<f64>) -> Vec<f64> {
    (0..m.nrows()).map(|r| m.row(r).mean()).collect()
}

fn degenerate(source: Source) -> AnalysisError {
    AnalysisError::DegenerateError {
        stratum: source.to_string(),
    }
}

// =============================================================================
// Mixed design: Condition between subjects, Time within
// =============================================================================

fn mixed(margins: &Margins, table: &SubjectTable) -> Result<Partition, AnalysisError> {
    let a = margins.a;
    let b = margins.b;
    let n_subjects = table.n_subjects();
    let subject_means = row_means(&table.scores);

    // Subjects within conditions: b Σ (ȳ_s − ȳ_condition)²
    let ss_subject: f64 = subject_means
        .iter()
        .zip(&table.groups)
        .map(|(m, &g)| b as f64 * (m - margins.condition_means[g]).powi(2))
        .sum();

    // Time × Subject within conditions
    let mut ss_residual = 0.0;
    for s in 0..n_subjects {
        let g = table.groups[s];
        for t in 0..b {
            let dev = table.scores[(s, t)] - subject_means[s] - margins.cell_means[g * b + t]
                + margins.condition_means[g];
            ss_residual += dev * dev;
        }
    }

    let df_subject = n_subjects.saturating_sub(a);
    if df_subject == 0 {
        return Err(degenerate(Source::Subject));
    }
    let df_residual = df_subject * (b - 1);

    let subject = AnovaRow::error(Source::Subject, df_subject, ss_subject);
    let residual = AnovaRow::error(Source::Residual, df_residual, ss_residual);

    let subject_error = ErrorTerm {
        ms: subject.ms,
        df: df_subject as f64,
    };
    let residual_error = ErrorTerm {
        ms: residual.ms,
        df: df_residual as f64,
    };

    let rows = vec![
        AnovaRow::effect(Source::Condition, a - 1, margins.ss_condition(), &subject),
        subject,
        AnovaRow::effect(Source::Time, b - 1, margins.ss_time(), &residual),
        AnovaRow::effect(
            Source::ConditionTime,
            (a - 1) * (b - 1),
            margins.ss_interaction(),
            &residual,
        ),
        residual,
    ];

    Ok(Partition {
        mode: AnovaMode::Mixed,
        rows,
        n_subjects: Some(n_subjects),
        within_time_error: ErrorTerm::pooled(subject_error, residual_error, (b - 1) as f64),
        within_condition_error: residual_error,
    })
}

// =============================================================================
// Within design: both factors within subjects
// =============================================================================

fn within(margins: &Margins, table: &SubjectTable) -> Result<Partition, AnalysisError> {
    let a = margins.a;
    let b = margins.b;
    let n_subjects = table.n_subjects();
    let g = margins.grand;
    let y = |s: usize, i: usize, j: usize| table.scores[(s, i * b + j)];

    let subject_means = row_means(&table.scores);
    // ȳ_s,i (averaged over time) and ȳ_s,j (averaged over condition)
    let sc_means = DMatrix::from_fn(n_subjects, a, |s, i| {
        (0..b).map(|j| y(s, i, j)).sum::<f64>() / b as f64
    });
    let st_means = DMatrix::from_fn(n_subjects, b, |s, j| {
        (0..a).map(|i| y(s, i, j)).sum::<f64>() / a as f64
    });
    let r = &margins.condition_means;
    let c = &margins.time_means;
    let m = |i: usize, j: usize| margins.cell_means[i * b + j];

    let ss_subject: f64 = subject_means
        .iter()
        .map(|ms| (a * b) as f64 * (ms - g).powi(2))
        .sum();

    let mut ss_cs = 0.0;
    let mut ss_ts = 0.0;
    let mut ss_residual = 0.0;
    for s in 0..n_subjects {
        let ys = subject_means[s];
        for i in 0..a {
            ss_cs += b as f64 * (sc_means[(s, i)] - ys - r[i] + g).powi(2);
        }
        for j in 0..b {
            ss_ts += a as f64 * (st_means[(s, j)] - ys - c[j] + g).powi(2);
        }
        for i in 0..a {
            for j in 0..b {
                let dev = y(s, i, j) - sc_means[(s, i)] - st_means[(s, j)] - m(i, j)
                    + ys
                    + r[i]
                    + c[j]
                    - g;
                ss_residual += dev * dev;
            }
        }
    }

    let df_subject = n_subjects - 1;
    if df_subject == 0 {
        return Err(degenerate(Source::Subject));
    }
    let df_c = a - 1;
    let df_t = b - 1;

    let cs = AnovaRow::error(Source::ConditionSubject, df_c * df_subject, ss_cs);
    let ts = AnovaRow::error(Source::TimeSubject, df_t * df_subject, ss_ts);
    let residual = AnovaRow::error(Source::Residual, df_c * df_t * df_subject, ss_residual);

    let term = |row: &AnovaRow| ErrorTerm {
        ms: row.ms,
        df: row.df as f64,
    };
    let within_time_error = ErrorTerm::pooled(term(&cs), term(&residual), df_t as f64);
    let within_condition_error = ErrorTerm::pooled(term(&ts), term(&residual), df_c as f64);

    let rows = vec![
        AnovaRow::error(Source::Subject, df_subject, ss_subject),
        AnovaRow::effect(Source::Condition, df_c, margins.ss_condition(), &cs),
        cs,
        AnovaRow::effect(Source::Time, df_t, margins.ss_time(), &ts),
        ts,
        AnovaRow::effect(
            Source::ConditionTime,
            df_c * df_t,
            margins.ss_interaction(),
            &residual,
        ),
        residual,
    ];

    Ok(Partition {
        mode: AnovaMode::Within,
        rows,
        n_subjects: Some(n_subjects),
        within_time_error,
        within_condition_error,
    })
}

// =============================================================================
// Sphericity
// =============================================================================

fn apply_sphericity(
    rows: &mut [AnovaRow],
    table: &SubjectTable,
    margins: &Margins,
    design: Design,
    options: &AnovaOptions,
) {
    let a = margins.a;
    let b = margins.b;
    let within = design == Design::WithinSubjects;
    let n_groups = if within { 1 } else { a };
    let error_dfs: HashMap<Source, usize> = rows
        .iter()
        .filter(|r| r.source.is_error())
        .map(|r| (r.source, r.df))
        .collect();

    for row in rows.iter_mut() {
        let contrasts = match (row.source, within) {
            (Source::Time, false) | (Source::ConditionTime, false) => helmert(b),
            (Source::Condition, true) => helmert(a).kronecker(&average(b)),
            (Source::Time, true) => average(a).kronecker(&helmert(b)),
            (Source::ConditionTime, true) => helmert(a).kronecker(&helmert(b)),
            _ => continue,
        };

        let Some(mut sphericity) = assess(&table.scores, &table.groups, n_groups, &contrasts)
        else {
            continue;
        };

        let error_df = row
            .error_term
            .and_then(|source| error_dfs.get(&source))
            .map_or(f64::NAN, |&df| df as f64);
        let eps = sphericity.gg_epsilon;
        sphericity.corrected_p_value = row
            .f
            .map_or(f64::NAN, |f| f_upper_tail(f, eps * row.df as f64, eps * error_df));
        sphericity.applied = !sphericity.corrected_p_value.is_nan()
            && match options.sphericity {
                SphericityCorrection::None => false,
                SphericityCorrection::GreenhouseGeisser => true,
                SphericityCorrection::Auto => sphericity.mauchly_p < options.alpha,
            };

        row.sphericity = Some(sphericity);
    }
}
