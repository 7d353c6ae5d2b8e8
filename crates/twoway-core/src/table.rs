//! Flat, row-oriented views of the results.
//!
//! Every result type can be turned into a header row plus string rows for
//! tabular display, CSV export or charting: one row per source of variation
//! for the ANOVA, one row per contrast for the post-hoc family, one row per
//! group for the descriptive and assumption tables.

use crate::anova::AnovaResult;
use crate::dataset::GroupSummary;
use crate::normality::GroupNormality;
use crate::outliers::GroupOutliers;
use crate::posthoc::PostHocResult;
use crate::types::TestOutcome;

/// A result that can be flattened into rows of strings.
pub trait Table {
    /// Column names.
    fn headers(&self) -> Vec<String>;

    /// Data rows, each as long as [`headers`](Table::headers).
    fn rows(&self) -> Vec<Vec<String>>;
}

/// Format a statistic with four decimals; NaN becomes `NA`.
pub fn number(x: f64) -> String {
    if x.is_nan() {
        "NA".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else {
        format!("{:.4}", x)
    }
}

/// Format a p-value, switching to scientific notation below 1e-4.
pub fn p_value(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p > 0.0 && p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    }
}

fn optional(x: Option<f64>, f: fn(f64) -> String) -> String {
    x.map(f).unwrap_or_default()
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Table for AnovaResult {
    fn headers(&self) -> Vec<String> {
        headers(&[
            "source", "df", "ss", "ms", "f", "p_value", "error_term", "ges", "gg_epsilon",
            "p_value_gg", "mauchly_p",
        ])
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.source.to_string(),
                    r.df.to_string(),
                    number(r.ss),
                    number(r.ms),
                    optional(r.f, number),
                    optional(r.p_value, p_value),
                    r.error_term.map(|s| s.to_string()).unwrap_or_default(),
                    optional(r.ges, number),
                    optional(r.sphericity.map(|s| s.gg_epsilon), number),
                    optional(r.sphericity.map(|s| s.corrected_p_value), p_value),
                    optional(r.sphericity.map(|s| s.mauchly_p), p_value),
                ]
            })
            .collect()
    }
}

impl Table for PostHocResult {
    fn headers(&self) -> Vec<String> {
        let by = self.by.to_string().to_lowercase();
        let mut h = vec![by];
        h.extend(headers(&[
            "contrast",
            "estimate",
            "se",
            "df",
            "t_ratio",
            "p_value",
            "p_adjusted",
            "ci_lower",
            "ci_upper",
        ]));
        h
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.contrasts
            .iter()
            .map(|c| {
                vec![
                    c.level.clone(),
                    format!("{} - {}", c.first, c.second),
                    number(c.estimate),
                    number(c.se),
                    number(c.df),
                    number(c.t_ratio),
                    p_value(c.p_value),
                    p_value(c.adjusted_p_value),
                    number(c.ci_lower),
                    number(c.ci_upper),
                ]
            })
            .collect()
    }
}

impl Table for [GroupSummary] {
    fn headers(&self) -> Vec<String> {
        headers(&[
            "condition", "time", "n", "mean", "sd", "se", "median", "q1", "q3",
        ])
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|s| {
                vec![
                    s.condition.clone(),
                    s.time.clone(),
                    s.n.to_string(),
                    number(s.mean),
                    number(s.sd),
                    number(s.se),
                    number(s.median),
                    number(s.q1),
                    number(s.q3),
                ]
            })
            .collect()
    }
}

impl Table for [GroupOutliers] {
    fn headers(&self) -> Vec<String> {
        headers(&["condition", "time", "subject", "value", "severity"])
    }

    /// One row per flagged observation; groups without outliers add no rows.
    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .flat_map(|g| {
                g.outliers.iter().map(move |o| {
                    vec![
                        g.condition.clone(),
                        g.time.clone(),
                        o.subject.clone(),
                        number(o.value),
                        o.severity.to_string(),
                    ]
                })
            })
            .collect()
    }
}

impl Table for [GroupNormality] {
    fn headers(&self) -> Vec<String> {
        headers(&["condition", "time", "n", "statistic", "p_value", "note"])
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|g| match &g.outcome {
                TestOutcome::Tested(sw) => vec![
                    g.condition.clone(),
                    g.time.clone(),
                    sw.n.to_string(),
                    number(sw.statistic),
                    p_value(sw.p_value),
                    String::new(),
                ],
                TestOutcome::Indeterminate(reason) => vec![
                    g.condition.clone(),
                    g.time.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                    reason.to_string(),
                ],
            })
            .collect()
    }
}
