//! Terminal output formatting with colors.
//!
//! The result tables come from `twoway_core::formatting`; this module adds
//! the report header, design warnings, exclusions and the assumption notes.

use colored::Colorize;

use twoway_core::formatting::{
    format_anova, format_assumptions, format_outliers, format_posthoc, format_summaries, SEPARATOR,
};

use crate::report::Report;

/// Format a Report for human-readable terminal output.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n{}\n\n", "twoway".bold(), SEPARATOR));
    out.push_str(&format!(
        "  Design: {}, {} observations analysed\n",
        report.design,
        report.n_analysed()
    ));
    out.push_str(&format!(
        "  Outlier policy: {}; post-hoc error: {}\n",
        report.config.outlier_policy, report.config.error_term
    ));
    for warning in &report.warnings {
        out.push_str(&format!("  {} {}\n", "\u{26A0}".yellow(), warning));
    }
    for o in &report.excluded {
        out.push_str(&format!(
            "  {} excluded subject {} (value {})\n",
            "\u{2717}".red(),
            o.subject,
            o.value
        ));
    }
    out.push('\n');

    let alpha = report.config.alpha;
    for section in [
        format_summaries(&report.summaries),
        format_outliers(&report.outliers),
        format_assumptions(&report.normality, &report.homogeneity, alpha),
        format_anova(&report.anova, alpha),
        format_posthoc(&report.posthoc),
    ] {
        out.push_str(&section);
        out.push('\n');
    }

    out.push_str(&format_violations(report));
    out
}

/// The advisory assumption notes, or a confirmation that there are none.
pub fn format_violations(report: &Report) -> String {
    let violations = report.assumption_violations(report.config.alpha);
    if violations.is_empty() {
        return format!(
            "  {}\n",
            "\u{2713} No assumption violations detected".green()
        );
    }

    let mut out = format!("  {}\n", "Assumption notes:".yellow().bold());
    for v in violations {
        out.push_str(&format!("    \u{2022} {}\n", v));
    }
    out
}
