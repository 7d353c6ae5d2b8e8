//! Boxplot-rule outlier screen.
//!
//! For each (condition, time) group the Type 7 quartiles give the inner
//! fences Q1 − 1.5·IQR, Q3 + 1.5·IQR and the outer fences Q1 − 3·IQR,
//! Q3 + 3·IQR. A value outside the inner fences is a **mild** outlier; a
//! value outside the outer fences is an **extreme** outlier. Every extreme
//! outlier is also outside the inner fences.
//!
//! The screen only classifies. Whether anything is removed is decided by the
//! caller's outlier policy.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::constants::{EXTREME_FENCE_MULTIPLIER, MILD_FENCE_MULTIPLIER};
use crate::dataset::{Dataset, Group};
use crate::statistics::{quartiles, Quartiles};

/// How far outside the box a value lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Beyond 1.5·IQR but within 3·IQR.
    Mild,
    /// Beyond 3·IQR.
    Extreme,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Mild => write!(f, "mild"),
            Severity::Extreme => write!(f, "extreme"),
        }
    }
}

/// Inner and outer boxplot fences of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fences {
    /// Sample quartiles the fences are built from.
    pub quartiles: Quartiles,
    /// Q1 − 1.5·IQR.
    pub mild_lower: f64,
    /// Q3 + 1.5·IQR.
    pub mild_upper: f64,
    /// Q1 − 3·IQR.
    pub extreme_lower: f64,
    /// Q3 + 3·IQR.
    pub extreme_upper: f64,
}

impl Fences {
    /// Build fences from a non-empty sample.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn from_values(values: &[f64]) -> Self {
        let q = quartiles(values);
        let iqr = q.iqr();
        Self {
            quartiles: q,
            mild_lower: q.q1 - MILD_FENCE_MULTIPLIER * iqr,
            mild_upper: q.q3 + MILD_FENCE_MULTIPLIER * iqr,
            extreme_lower: q.q1 - EXTREME_FENCE_MULTIPLIER * iqr,
            extreme_upper: q.q3 + EXTREME_FENCE_MULTIPLIER * iqr,
        }
    }

    /// Classify a value, `None` if it lies within the inner fences.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value < self.extreme_lower || value > self.extreme_upper {
            Some(Severity::Extreme)
        } else if value < self.mild_lower || value > self.mild_upper {
            Some(Severity::Mild)
        } else {
            None
        }
    }
}

/// One flagged observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// Position of the observation in the dataset.
    pub index: usize,
    /// Subject identifier.
    pub subject: String,
    /// Observed value.
    pub value: f64,
    /// Mild or extreme.
    pub severity: Severity,
}

/// Screening result for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutliers {
    /// Condition label.
    pub condition: String,
    /// Time label.
    pub time: String,
    /// Fences used for classification.
    pub fences: Fences,
    /// Flagged observations in input order.
    pub outliers: Vec<Outlier>,
}

impl GroupOutliers {
    /// Flagged observations of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Outlier> {
        self.outliers.iter().filter(move |o| o.severity == severity)
    }

    /// Number of mild outliers.
    pub fn n_mild(&self) -> usize {
        self.with_severity(Severity::Mild).count()
    }

    /// Number of extreme outliers.
    pub fn n_extreme(&self) -> usize {
        self.with_severity(Severity::Extreme).count()
    }
}

/// Classify every value in one group.
pub fn detect(group: &Group<'_>) -> GroupOutliers {
    let fences = Fences::from_values(group.values());
    let outliers = group
        .observations()
        .filter_map(|(index, obs)| {
            fences.classify(obs.value).map(|severity| Outlier {
                index,
                subject: obs.subject.clone(),
                value: obs.value,
                severity,
            })
        })
        .collect();

    GroupOutliers {
        condition: group.condition_label().to_string(),
        time: group.time_label().to_string(),
        fences,
        outliers,
    }
}

/// Screen every group of a dataset, in [`Dataset::groups`] order.
pub fn screen(dataset: &Dataset) -> Vec<GroupOutliers> {
    let groups = dataset.groups();

    #[cfg(feature = "parallel")]
    let results = groups.par_iter().map(detect).collect();

    #[cfg(not(feature = "parallel"))]
    let results = groups.iter().map(detect).collect();

    results
}

/// Dataset positions of all outliers at or above `severity`.
pub fn flagged_indices(screen: &[GroupOutliers], severity: Severity) -> Vec<usize> {
    let mut indices: Vec<usize> = screen
        .iter()
        .flat_map(|g| g.outliers.iter())
        .filter(|o| o.severity >= severity)
        .map(|o| o.index)
        .collect();
    indices.sort_unstable();
    indices
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Outer fences enclose inner fences; extreme implies mild
        #[test]
        fn prop_fences_nested(
            data in prop::collection::vec(-1e4f64..1e4, 1..60),
            probe in -1e5f64..1e5,
        ) {
            let fences = Fences::from_values(&data);
            prop_assert!(fences.extreme_lower <= fences.mild_lower);
            prop_assert!(fences.mild_upper <= fences.extreme_upper);

            if fences.classify(probe) == Some(Severity::Extreme) {
                prop_assert!(probe < fences.mild_lower || probe > fences.mild_upper);
            }
        }
    }
}
