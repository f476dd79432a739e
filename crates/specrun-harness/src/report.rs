//! Run report rendering.

use serde::{Deserialize, Serialize};
use specrun_core::{Outcome, RunSummary};

use crate::structured_log::now_utc;

/// A conformance run report: summary counters, per-case results in
/// registration order, and configuration warnings (stale exclusions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Report title.
    pub title: String,
    /// Campaign the run belonged to.
    pub campaign: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    /// Aggregate results.
    pub summary: RunSummary,
    /// Exclusion entries that matched no registered case. Surfaced for
    /// maintenance, never fatal, never part of exit status.
    pub warnings: Vec<String>,
}

impl ConformanceReport {
    /// Build a report stamped with the current time.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        campaign: impl Into<String>,
        summary: RunSummary,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            campaign: campaign.into(),
            timestamp: now_utc(),
            summary,
            warnings,
        }
    }

    /// Render the report as markdown, grouped by outcome.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Campaign: {}\n", self.campaign));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!("- Failed: {}\n", self.summary.failed));
        out.push_str(&format!("- Errors: {}\n", self.summary.errors));
        out.push_str(&format!("- Skipped: {}\n\n", self.summary.skipped));

        self.push_group(&mut out, "Failures", Outcome::Fail, |r| {
            let diagnostic = r.diagnostic.as_ref();
            format!(
                "expected {}, got {}",
                diagnostic
                    .and_then(|d| d.expected.as_deref())
                    .unwrap_or("?"),
                diagnostic.and_then(|d| d.actual.as_deref()).unwrap_or("?"),
            )
        });
        self.push_group(&mut out, "Errors", Outcome::Error, |r| {
            r.diagnostic
                .as_ref()
                .and_then(|d| d.failure.clone())
                .unwrap_or_else(|| String::from("?"))
        });
        self.push_group(&mut out, "Skipped", Outcome::Skipped, |r| {
            r.skip_reason
                .clone()
                .unwrap_or_else(|| String::from("no reason recorded"))
        });

        if !self.warnings.is_empty() {
            out.push_str("## Warnings\n\n");
            for warning in &self.warnings {
                out.push_str(&format!("- {warning}\n"));
            }
            out.push('\n');
        }
        out
    }

    fn push_group(
        &self,
        out: &mut String,
        heading: &str,
        outcome: Outcome,
        detail: impl Fn(&specrun_core::ExecutionResult) -> String,
    ) {
        let group: Vec<_> = self
            .summary
            .results
            .iter()
            .filter(|r| r.outcome == outcome)
            .collect();
        if group.is_empty() {
            return;
        }
        out.push_str(&format!("## {heading}\n\n"));
        out.push_str("| Case | Detail |\n");
        out.push_str("|------|--------|\n");
        for result in group {
            out.push_str(&format!("| {} | {} |\n", result.case_id, detail(result)));
        }
        out.push('\n');
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Process exit status for the run: nonzero iff any case failed or
    /// errored. Skipped cases and warnings never affect it.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.summary.all_passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specrun_core::{Diagnostic, ExecutionResult};

    fn report_with(results: Vec<ExecutionResult>, warnings: Vec<String>) -> ConformanceReport {
        ConformanceReport::new(
            "Conformance Report",
            "unit",
            RunSummary::from_results(results),
            warnings,
        )
    }

    #[test]
    fn markdown_groups_by_outcome() {
        let report = report_with(
            vec![
                ExecutionResult::pass("ok_case", 0),
                ExecutionResult::fail(
                    "off_case",
                    1,
                    Diagnostic {
                        expected: Some(String::from("0.75")),
                        actual: Some(String::from("0.5")),
                        failure: None,
                        diff: None,
                    },
                ),
                ExecutionResult::error("bad_case", 2, "boom"),
                ExecutionResult::skipped("hung_case", 3, "hangs"),
            ],
            vec![String::from("exclusion `long_gone` matches no case")],
        );

        let md = report.to_markdown();
        assert!(md.contains("## Failures"));
        assert!(md.contains("| off_case | expected 0.75, got 0.5 |"));
        assert!(md.contains("## Errors"));
        assert!(md.contains("| bad_case | boom |"));
        assert!(md.contains("## Skipped"));
        assert!(md.contains("| hung_case | hangs |"));
        assert!(md.contains("## Warnings"));
        assert!(md.contains("long_gone"));
    }

    #[test]
    fn exit_code_ignores_skips_and_warnings() {
        let green = report_with(
            vec![ExecutionResult::skipped("hung_case", 0, "hangs")],
            vec![String::from("stale entry")],
        );
        assert_eq!(green.exit_code(), 0);

        let red = report_with(vec![ExecutionResult::error("bad_case", 0, "boom")], vec![]);
        assert_eq!(red.exit_code(), 1);
    }

    #[test]
    fn empty_groups_are_omitted() {
        let report = report_with(vec![ExecutionResult::pass("only_pass", 0)], vec![]);
        let md = report.to_markdown();
        assert!(!md.contains("## Failures"));
        assert!(!md.contains("## Warnings"));
    }
}
