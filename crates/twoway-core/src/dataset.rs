//! Long-format observation data model.
//!
//! A [`Dataset`] holds one row per (subject, condition, time) measurement
//! together with the ordered level catalogs of the two factors. Groups
//! (condition × time cells) are views derived lazily from the observations
//! and cached for the lifetime of the dataset, which is immutable after
//! construction.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::statistics::{mean, quartiles, variance};

/// Which of the two design factors is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorKind {
    /// Treatment condition.
    Condition,
    /// Ordered measurement time.
    Time,
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorKind::Condition => write!(f, "Condition"),
            FactorKind::Time => write!(f, "Time"),
        }
    }
}

/// A categorical factor with a closed, ordered level set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    name: String,
    levels: Vec<String>,
}

impl Factor {
    /// Create a factor from its ordered levels.
    ///
    /// # Errors
    ///
    /// Returns `TooFewLevels` for fewer than two levels and `DuplicateLevel`
    /// if a label repeats.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        levels: impl IntoIterator<Item = S>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();

        if levels.len() < 2 {
            return Err(SchemaError::TooFewLevels {
                factor: name,
                got: levels.len(),
            });
        }

        let mut seen = HashSet::new();
        for label in &levels {
            if !seen.insert(label.as_str()) {
                return Err(SchemaError::DuplicateLevel {
                    factor: name.clone(),
                    label: label.clone(),
                });
            }
        }

        Ok(Self { name, levels })
    }

    /// Factor name (used in error messages and reports).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Levels in their declared order.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for a constructed factor; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Label of level `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn label(&self, index: usize) -> &str {
        &self.levels[index]
    }

    /// Position of `label` in the level order.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == label)
    }

    /// Resolve a label, failing with `UnknownLevel` if it is not declared.
    pub fn parse(&self, label: &str) -> Result<usize, SchemaError> {
        self.index_of(label).ok_or_else(|| SchemaError::UnknownLevel {
            factor: self.name.clone(),
            label: label.to_string(),
        })
    }
}

/// A single measurement.
///
/// `condition` and `time` are indices into the owning dataset's factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Subject identifier.
    pub subject: String,
    /// Condition level index.
    pub condition: usize,
    /// Time level index.
    pub time: usize,
    /// Outcome value.
    pub value: f64,
}

impl Observation {
    /// Create a new observation.
    pub fn new(subject: impl Into<String>, condition: usize, time: usize, value: f64) -> Self {
        Self {
            subject: subject.into(),
            condition,
            time,
            value,
        }
    }
}

/// How subjects relate to the condition factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Design {
    /// Every subject is observed under exactly one condition.
    BetweenSubjects,
    /// Every subject is observed under every condition.
    WithinSubjects,
    /// Some subjects see several, but not all, conditions.
    Unstructured,
}

impl std::fmt::Display for Design {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Design::BetweenSubjects => write!(f, "between-subjects condition"),
            Design::WithinSubjects => write!(f, "within-subjects condition"),
            Design::Unstructured => write!(f, "unstructured"),
        }
    }
}

/// Non-fatal configuration problems detected on a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignWarning {
    /// Cells hold different numbers of observations.
    ///
    /// The ANOVA is still computed with weighted marginal means, but the
    /// interaction sum of squares is then sequential rather than exact and may
    /// even come out negative.
    UnbalancedDesign {
        /// Smallest cell size.
        min_cell_size: usize,
        /// Largest cell size.
        max_cell_size: usize,
    },
}

impl std::fmt::Display for DesignWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignWarning::UnbalancedDesign {
                min_cell_size,
                max_cell_size,
            } => write!(
                f,
                "unbalanced design: cell sizes range from {} to {}; \
                 the interaction sum of squares is not an exact partition",
                min_cell_size, max_cell_size
            ),
        }
    }
}

/// Values and observation indices of one cell.
#[derive(Debug, Clone, Default)]
struct Cell {
    values: Vec<f64>,
    members: Vec<usize>,
}

/// An immutable, validated long-format dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    conditions: Factor,
    times: Factor,
    observations: Vec<Observation>,
    #[serde(skip)]
    cells: OnceLock<Vec<Cell>>,
}

impl Dataset {
    /// Build a dataset, validating every observation.
    ///
    /// # Errors
    ///
    /// - `LevelOutOfRange` if an observation refers to an undeclared level
    /// - `NonFiniteValue` for NaN or infinite outcomes
    /// - `DuplicateObservation` if a subject appears twice in one cell
    /// - `EmptyCell` if some (condition, time) combination has no data
    pub fn new(
        conditions: Factor,
        times: Factor,
        observations: Vec<Observation>,
    ) -> Result<Self, SchemaError> {
        let a = conditions.len();
        let b = times.len();
        let mut counts = vec![0usize; a * b];
        let mut seen: HashSet<(&str, usize, usize)> = HashSet::new();

        for (index, obs) in observations.iter().enumerate() {
            if obs.condition >= a {
                return Err(SchemaError::LevelOutOfRange {
                    factor: conditions.name().to_string(),
                    index: obs.condition,
                    levels: a,
                });
            }
            if obs.time >= b {
                return Err(SchemaError::LevelOutOfRange {
                    factor: times.name().to_string(),
                    index: obs.time,
                    levels: b,
                });
            }
            if !obs.value.is_finite() {
                return Err(SchemaError::NonFiniteValue { index });
            }
            if !seen.insert((obs.subject.as_str(), obs.condition, obs.time)) {
                return Err(SchemaError::DuplicateObservation {
                    subject: obs.subject.clone(),
                    condition: conditions.label(obs.condition).to_string(),
                    time: times.label(obs.time).to_string(),
                });
            }
            counts[obs.condition * b + obs.time] += 1;
        }

        if let Some(empty) = counts.iter().position(|&c| c == 0) {
            return Err(SchemaError::EmptyCell {
                condition: conditions.label(empty / b).to_string(),
                time: times.label(empty % b).to_string(),
            });
        }

        Ok(Self {
            conditions,
            times,
            observations,
            cells: OnceLock::new(),
        })
    }

    /// The condition factor.
    pub fn conditions(&self) -> &Factor {
        &self.conditions
    }

    /// The time factor.
    pub fn times(&self) -> &Factor {
        &self.times
    }

    /// Look up a factor by kind.
    pub fn factor(&self, kind: FactorKind) -> &Factor {
        match kind {
            FactorKind::Condition => &self.conditions,
            FactorKind::Time => &self.times,
        }
    }

    /// All observations in input order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the dataset has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of condition × time cells.
    pub fn n_cells(&self) -> usize {
        self.conditions.len() * self.times.len()
    }

    /// Flat cell index (condition-major).
    pub fn cell_index(&self, condition: usize, time: usize) -> usize {
        condition * self.times.len() + time
    }

    fn cells(&self) -> &[Cell] {
        self.cells.get_or_init(|| {
            let b = self.times.len();
            let mut cells = vec![Cell::default(); self.n_cells()];
            for (index, obs) in self.observations.iter().enumerate() {
                let cell = &mut cells[obs.condition * b + obs.time];
                cell.values.push(obs.value);
                cell.members.push(index);
            }
            cells
        })
    }

    /// The group for one (condition, time) cell.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn group(&self, condition: usize, time: usize) -> Group<'_> {
        let cell = &self.cells()[self.cell_index(condition, time)];
        Group {
            condition,
            time,
            condition_label: self.conditions.label(condition),
            time_label: self.times.label(time),
            values: &cell.values,
            members: &cell.members,
            observations: &self.observations,
        }
    }

    /// All groups, condition-major, each condition in time order.
    pub fn groups(&self) -> Vec<Group<'_>> {
        let b = self.times.len();
        (0..self.n_cells())
            .map(|idx| self.group(idx / b, idx % b))
            .collect()
    }

    /// Observation count per cell, condition-major.
    pub fn cell_sizes(&self) -> Vec<usize> {
        self.cells().iter().map(|c| c.values.len()).collect()
    }

    /// Check whether every cell has the same number of observations.
    pub fn is_balanced(&self) -> bool {
        let sizes = self.cell_sizes();
        sizes.windows(2).all(|w| w[0] == w[1])
    }

    /// Configuration warnings for this dataset.
    pub fn warnings(&self) -> Vec<DesignWarning> {
        let sizes = self.cell_sizes();
        let min_cell_size = sizes.iter().copied().min().unwrap_or(0);
        let max_cell_size = sizes.iter().copied().max().unwrap_or(0);
        if min_cell_size == max_cell_size {
            Vec::new()
        } else {
            vec![DesignWarning::UnbalancedDesign {
                min_cell_size,
                max_cell_size,
            }]
        }
    }

    /// Mean of all observations.
    pub fn grand_mean(&self) -> f64 {
        let values: Vec<f64> = self.observations.iter().map(|o| o.value).collect();
        mean(&values)
    }

    /// Distinct subject identifiers in order of first appearance.
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .map(|o| o.subject.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Classify how subjects relate to the condition factor.
    pub fn design(&self) -> Design {
        let mut per_subject: HashMap<&str, HashSet<usize>> = HashMap::new();
        for obs in &self.observations {
            per_subject
                .entry(obs.subject.as_str())
                .or_default()
                .insert(obs.condition);
        }

        let a = self.conditions.len();
        if per_subject.values().all(|c| c.len() == 1) {
            Design::BetweenSubjects
        } else if per_subject.values().all(|c| c.len() == a) {
            Design::WithinSubjects
        } else {
            Design::Unstructured
        }
    }

    /// Descriptive summary of every group, in [`groups`](Self::groups) order.
    pub fn summaries(&self) -> Vec<GroupSummary> {
        self.groups().iter().map(Group::summary).collect()
    }

    /// A new dataset without the observations at the given input positions.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCell` if the removal empties a cell.
    pub fn without(&self, excluded: &[usize]) -> Result<Dataset, SchemaError> {
        let excluded: HashSet<usize> = excluded.iter().copied().collect();
        let observations = self
            .observations
            .iter()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .map(|(_, o)| o.clone())
            .collect();
        Dataset::new(self.conditions.clone(), self.times.clone(), observations)
    }
}

/// A read-only view of one (condition, time) cell.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    condition: usize,
    time: usize,
    condition_label: &'a str,
    time_label: &'a str,
    values: &'a [f64],
    members: &'a [usize],
    observations: &'a [Observation],
}

impl<'a> Group<'a> {
    /// Condition level index.
    pub fn condition(&self) -> usize {
        self.condition
    }

    /// Time level index.
    pub fn time(&self) -> usize {
        self.time
    }

    /// Condition label.
    pub fn condition_label(&self) -> &'a str {
        self.condition_label
    }

    /// Time label.
    pub fn time_label(&self) -> &'a str {
        self.time_label
    }

    /// Outcome values in input order.
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Observations in this cell with their positions in the dataset.
    pub fn observations(&self) -> impl Iterator<Item = (usize, &'a Observation)> + 'a {
        let observations = self.observations;
        self.members.iter().map(move |&i| (i, &observations[i]))
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the group holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Group mean.
    pub fn mean(&self) -> f64 {
        mean(self.values)
    }

    /// Descriptive summary for reporting.
    pub fn summary(&self) -> GroupSummary {
        let n = self.len();
        let sd = variance(self.values).sqrt();
        let q = quartiles(self.values);
        GroupSummary {
            condition: self.condition_label.to_string(),
            time: self.time_label.to_string(),
            n,
            mean: self.mean(),
            sd,
            se: sd / (n as f64).sqrt(),
            median: q.median,
            q1: q.q1,
            q3: q.q3,
        }
    }
}

/// Summary statistics of one group, flat for tabular display.
///
/// `sd` and `se` are NaN for single-observation groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Condition label.
    pub condition: String,
    /// Time label.
    pub time: String,
    /// Number of observations.
    pub n: usize,
    /// Mean.
    pub mean: f64,
    /// Standard deviation (n − 1).
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub sd: f64,
    /// Standard error of the mean.
    #[serde(deserialize_with = "crate::serde_util::nan_if_null")]
    pub se: f64,
    /// Median.
    pub median: f64,
    /// First quartile.
    pub q1: f64,
    /// Third quartile.
    pub q3: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors() -> (Factor, Factor) {
        (
            Factor::new("condition", ["placebo", "ketone"]).unwrap(),
            Factor::new("time", ["t0", "t30"]).unwrap(),
        )
    }

    fn balanced() -> Dataset {
        let (c, t) = factors();
        let mut obs = Vec::new();
        for (s, cond) in [("s1", 0), ("s2", 0), ("s3", 1), ("s4", 1)] {
            for time in 0..2 {
                obs.push(Observation::new(s, cond, time, (cond * 10 + time) as f64));
            }
        }
        Dataset::new(c, t, obs).unwrap()
    }

    #[test]
    fn test_factor_validation() {
        assert!(matches!(
            Factor::new("condition", ["only"]),
            Err(SchemaError::TooFewLevels { got: 1, .. })
        ));
        assert!(matches!(
            Factor::new("time", ["a", "b", "a"]),
            Err(SchemaError::DuplicateLevel { .. })
        ));

        let f = Factor::new("time", ["t0", "t30", "t60"]).unwrap();
        assert_eq!(f.parse("t30"), Ok(1));
        assert!(matches!(
            f.parse("t90"),
            Err(SchemaError::UnknownLevel { .. })
        ));
    }

    #[test]
    fn test_groups_and_design() {
        let ds = balanced();
        assert_eq!(ds.n_cells(), 4);
        assert!(ds.is_balanced());
        assert!(ds.warnings().is_empty());
        assert_eq!(ds.design(), Design::BetweenSubjects);

        let g = ds.group(1, 1);
        assert_eq!(g.condition_label(), "ketone");
        assert_eq!(g.time_label(), "t30");
        assert_eq!(g.values(), &[11.0, 11.0]);
        assert_eq!(ds.subjects(), vec!["s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_empty_cell_rejected() {
        let (c, t) = factors();
        let obs = vec![
            Observation::new("s1", 0, 0, 1.0),
            Observation::new("s1", 0, 1, 1.0),
            Observation::new("s2", 1, 0, 1.0),
        ];
        assert!(matches!(
            Dataset::new(c, t, obs),
            Err(SchemaError::EmptyCell { .. })
        ));
    }

    #[test]
    fn test_non_finite_and_duplicates_rejected() {
        let (c, t) = factors();
        let obs = vec![Observation::new("s1", 0, 0, f64::NAN)];
        assert_eq!(
            Dataset::new(c.clone(), t.clone(), obs).unwrap_err(),
            SchemaError::NonFiniteValue { index: 0 }
        );

        let obs = vec![
            Observation::new("s1", 0, 0, 1.0),
            Observation::new("s1", 0, 0, 2.0),
        ];
        assert!(matches!(
            Dataset::new(c, t, obs),
            Err(SchemaError::DuplicateObservation { .. })
        ));
    }

    #[test]
    fn test_unbalanced_warning_and_without() {
        let ds = balanced();
        let smaller = ds.without(&[0]).unwrap();
        assert_eq!(smaller.len(), 7);
        assert!(!smaller.is_balanced());
        assert_eq!(
            smaller.warnings(),
            vec![DesignWarning::UnbalancedDesign {
                min_cell_size: 1,
                max_cell_size: 2
            }]
        );
        assert!(ds.without(&[0, 2]).is_err());
    }

    #[test]
    fn test_within_design_detected() {
        let (c, t) = factors();
        let mut obs = Vec::new();
        for s in ["a", "b"] {
            for cond in 0..2 {
                for time in 0..2 {
                    obs.push(Observation::new(s, cond, time, 1.0));
                }
            }
        }
        let ds = Dataset::new(c, t, obs).unwrap();
        assert_eq!(ds.design(), Design::WithinSubjects);
    }

    #[test]
    fn test_summary() {
        let (c, t) = factors();
        let mut obs = Vec::new();
        for (i, v) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            for cond in 0..2 {
                for time in 0..2 {
                    obs.push(Observation::new(format!("s{}-{}", i, cond), cond, time, *v));
                }
            }
        }
        let ds = Dataset::new(c, t, obs).unwrap();
        let s = ds.group(0, 0).summary();
        assert_eq!(s.n, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert!((s.sd - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((s.se - s.sd / 2.0).abs() < 1e-12);
        assert_eq!(ds.summaries().len(), 4);
    }
}
