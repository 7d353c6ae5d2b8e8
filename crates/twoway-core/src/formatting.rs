//! Plain-text rendering of the analysis tables.
//!
//! Column widths are computed on uncolored text; color is applied after
//! padding so alignment holds whether or not ANSI codes are emitted.

use std::fmt::Write;

use crate::anova::AnovaResult;
use crate::colors::{bold, dim, green, red, yellow};
use crate::dataset::GroupSummary;
use crate::homogeneity::HomogeneityOutcome;
use crate::normality::GroupNormality;
use crate::outliers::{GroupOutliers, Severity};
use crate::posthoc::PostHocResult;
use crate::table::{self, Table};
use crate::types::TestOutcome;

/// Separator line used in output.
pub const SEPARATOR: &str = "──────────────────────────────────────────────────────────────";

/// Gap between columns.
const COLUMN_GAP: &str = "  ";

// ============================================================================
// Generic tables
// ============================================================================

/// R-style significance code for a p-value.
pub fn significance_code(p: f64) -> &'static str {
    if p.is_nan() {
        ""
    } else if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else if p < 0.1 {
        "."
    } else {
        ""
    }
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Pad cells to their column width: the first column left-aligned, the rest right-aligned.
fn aligned(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == 0 {
                format!("{:<w$}", cell, w = w)
            } else {
                format!("{:>w$}", cell, w = w)
            }
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP)
}

fn write_rows(
    out: &mut String,
    headers: &[String],
    rows: &[Vec<String>],
    mut suffix: impl FnMut(usize) -> String,
) {
    let widths = column_widths(headers, rows);
    writeln!(out, "  {}", bold(&aligned(headers, &widths))).unwrap();
    for (i, row) in rows.iter().enumerate() {
        let line = aligned(row, &widths);
        let extra = suffix(i);
        if extra.is_empty() {
            writeln!(out, "  {}", line.trim_end()).unwrap();
        } else {
            writeln!(out, "  {}{}{}", line, COLUMN_GAP, extra).unwrap();
        }
    }
}

/// Render any [`Table`] as aligned plain text.
pub fn format_table<T: Table + ?Sized>(table: &T) -> String {
    let mut out = String::new();
    write_rows(&mut out, &table.headers(), &table.rows(), |_| String::new());
    out
}

fn section(out: &mut String, title: &str) {
    writeln!(out, "{}", bold(title)).unwrap();
    writeln!(out, "{}", SEPARATOR).unwrap();
}

// ============================================================================
// Result-specific sections
// ============================================================================

/// Descriptive statistics per cell.
pub fn format_summaries(summaries: &[GroupSummary]) -> String {
    let mut out = String::new();
    section(&mut out, "Descriptive statistics");
    out.push_str(&format_table(summaries));
    out
}

/// The ANOVA table with significance codes.
///
/// Rows whose reported p-value (sphericity-corrected when a correction was
/// applied) falls below `alpha` are marked in color.
pub fn format_anova(result: &AnovaResult, alpha: f64) -> String {
    let mut out = String::new();
    section(&mut out, &format!("ANOVA ({})", result.mode));

    let headers = result.headers();
    let rows = result.rows();
    write_rows(&mut out, &headers, &rows, |i| {
        let row = &result.rows[i];
        match row.reported_p_value() {
            Some(p) => {
                let code = significance_code(p);
                if row.is_significant(alpha) {
                    green(code)
                } else {
                    code.to_string()
                }
            }
            None => String::new(),
        }
    });

    writeln!(out).unwrap();
    writeln!(
        out,
        "  {}",
        dim(&format!(
            "Total SS = {} on {} df; Signif. codes: 0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1",
            table::number(result.total_ss),
            result.total_df
        ))
    )
    .unwrap();
    if let Some(n) = result.n_subjects {
        writeln!(out, "  {}", dim(&format!("{} subjects", n))).unwrap();
    }
    if !result.balanced {
        writeln!(
            out,
            "  {}",
            yellow("Unbalanced design: sequential interaction SS may be negative")
        )
        .unwrap();
    }
    for row in result.rows.iter() {
        if let Some(s) = row.sphericity.filter(|s| s.applied) {
            writeln!(
                out,
                "  {}",
                dim(&format!(
                    "{}: Greenhouse-Geisser epsilon = {}, corrected p = {}",
                    row.source,
                    table::number(s.gg_epsilon),
                    table::p_value(s.corrected_p_value)
                ))
            )
            .unwrap();
        }
    }
    out
}

/// Pairwise comparisons, one block per conditioning level.
pub fn format_posthoc(result: &PostHocResult) -> String {
    let mut out = String::new();
    section(
        &mut out,
        &format!(
            "Tukey comparisons of {} within {}",
            result.grouping, result.by
        ),
    );

    let headers = result.headers();
    let rows = result.rows();
    write_rows(&mut out, &headers, &rows, |i| {
        if result.contrasts[i].significant {
            green("*")
        } else {
            String::new()
        }
    });

    writeln!(out).unwrap();
    writeln!(
        out,
        "  {}",
        dim(&format!(
            "Error: {} (MS = {}, df = {}); adjusted for {} means; {}% intervals",
            result.error_source,
            table::number(result.error.ms),
            table::number(result.error.df),
            result.nmeans,
            result.confidence_level * 100.0
        ))
    )
    .unwrap();
    out
}

/// Flagged observations, or a one-line note when there are none.
pub fn format_outliers(screen: &[GroupOutliers]) -> String {
    let mut out = String::new();
    section(&mut out, "Outliers");

    let rows = screen.rows();
    if rows.is_empty() {
        writeln!(out, "  {}", green("No outliers flagged")).unwrap();
        return out;
    }

    let flagged: Vec<Severity> = screen
        .iter()
        .flat_map(|g| g.outliers.iter().map(|o| o.severity))
        .collect();
    write_rows(&mut out, &screen.headers(), &rows, |i| match flagged[i] {
        Severity::Extreme => red("!"),
        Severity::Mild => String::new(),
    });
    out
}

/// Normality per cell and the homogeneity test.
pub fn format_assumptions(
    normality: &[GroupNormality],
    homogeneity: &HomogeneityOutcome,
    alpha: f64,
) -> String {
    let mut out = String::new();
    section(&mut out, "Normality (Shapiro-Wilk)");
    write_rows(&mut out, &normality.headers(), &normality.rows(), |i| {
        if normality[i].violates(alpha) {
            yellow("non-normal")
        } else {
            String::new()
        }
    });

    writeln!(out).unwrap();
    section(&mut out, "Homogeneity of variance (Bartlett)");
    match homogeneity {
        TestOutcome::Tested(b) => {
            let line = format!(
                "K² = {}, df = {}, p = {}",
                table::number(b.statistic),
                b.df,
                table::p_value(b.p_value)
            );
            if b.violates(alpha) {
                writeln!(out, "  {}  {}", line, yellow("unequal variances")).unwrap();
            } else {
                writeln!(out, "  {}", line).unwrap();
            }
        }
        TestOutcome::Indeterminate(reason) => {
            writeln!(out, "  {}", dim(&format!("not computed: {}", reason))).unwrap();
        }
    }
    out
}
