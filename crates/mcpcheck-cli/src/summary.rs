//! Plain-text rendering of a suite report.

use mcpcheck_types::{TestResult, TestStatus, TestSuiteResult};
use std::fmt::Write;

/// Render `report` grouped by category, one line per scenario.
///
/// Notes on passing scenarios are only included when `verbose` is set.
pub fn render(report: &TestSuiteResult, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "mcpcheck run {} against `{}`", report.short_id(), report.target);

    let mut current = None;
    for result in &report.results {
        if current != Some(result.category) {
            current = Some(result.category);
            let _ = writeln!(out, "\n{}", result.category);
        }
        let _ = writeln!(
            out,
            "  {:<4}  {} ({}ms)",
            result.status,
            result.name,
            result.duration.as_millis()
        );
        if let Some(error) = &result.error {
            let _ = writeln!(out, "        {error}");
        }
        if let Some(note) = &result.note {
            if result.status == TestStatus::Skipped || verbose {
                let _ = writeln!(out, "        {note}");
            }
        }
    }

    let counts = &report.counts;
    let _ = writeln!(
        out,
        "\n{} scenarios: {} passed, {} failed, {} skipped in {:.2}s",
        counts.total,
        counts.passed,
        counts.failed,
        counts.skipped,
        report.duration.as_secs_f64()
    );
    out
}

/// Render the scenarios a run would execute, grouped by category.
pub fn render_plan(planned: &[TestResult]) -> String {
    let mut out = String::new();
    let mut current = None;
    for result in planned {
        if current != Some(result.category) {
            current = Some(result.category);
            let _ = writeln!(out, "{}", result.category);
        }
        let _ = writeln!(out, "  {:<7}  {}", result.status, result.name);
    }
    let _ = writeln!(out, "\n{} scenarios", planned.len());
    out
}
