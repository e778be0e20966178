//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use kubeforge_manifest::validator::{ValidationReport, ValidationSummary};

/// Formats one validation report as indented human-readable lines.
#[must_use]
pub fn format_report(report: &ValidationReport) -> String {
    let status = if report.valid { "ok" } else { "FAIL" };
    let mut out = format!("{}/{}: {status}", report.kind, report.name);
    for error in &report.errors {
        let _ = write!(out, "\n  error: {error}");
    }
    for warning in &report.warnings {
        let _ = write!(out, "\n  warning: {warning}");
    }
    out
}

/// Formats a whole validation summary, one report per object plus a totals
/// line.
#[must_use]
pub fn format_summary(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    for report in &summary.reports {
        let _ = writeln!(out, "{}", format_report(report));
    }
    let _ = write!(
        out,
        "{} object(s), {} error(s), {} warning(s)",
        summary.reports.len(),
        summary.error_count(),
        summary.warning_count()
    );
    out
}
