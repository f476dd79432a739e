//! Execution outcomes and the per-case result record.

use serde::{Deserialize, Serialize};

/// Terminal outcome of one case in one run.
///
/// `Fail` means the operation completed but its result did not satisfy the
/// expectation; `Error` means the operation itself raised (or breached its
/// deadline). Skipped cases never execute at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
    Skipped,
}

impl Outcome {
    /// Stable label used in reports and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this outcome makes the run exit nonzero. Skipped cases never
    /// affect exit status.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Fail | Self::Error)
    }
}

/// Captured evidence for a fail or error outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Expected side, as declared by the case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value the operation returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Captured failure description for `error` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Rendered expected/actual diff for `fail` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Result of one case in one run. Created once per case, never mutated
/// after creation, collected into the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Case identifier.
    pub case_id: String,
    /// Registration index carried over from the case.
    pub seq: usize,
    /// Terminal outcome.
    pub outcome: Outcome,
    /// Evidence for fail/error outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
    /// Stored exclusion reason for skipped cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Wall-clock execution time. Zero for skipped cases.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// A passing result.
    #[must_use]
    pub fn pass(case_id: impl Into<String>, seq: usize) -> Self {
        Self::terminal(case_id, seq, Outcome::Pass, None, None)
    }

    /// A failing result with the captured expected/actual evidence.
    #[must_use]
    pub fn fail(case_id: impl Into<String>, seq: usize, diagnostic: Diagnostic) -> Self {
        Self::terminal(case_id, seq, Outcome::Fail, Some(diagnostic), None)
    }

    /// An error result with the captured failure description.
    #[must_use]
    pub fn error(case_id: impl Into<String>, seq: usize, failure: impl Into<String>) -> Self {
        let diagnostic = Diagnostic {
            failure: Some(failure.into()),
            ..Diagnostic::default()
        };
        Self::terminal(case_id, seq, Outcome::Error, Some(diagnostic), None)
    }

    /// A skipped result carrying the stored exclusion reason.
    #[must_use]
    pub fn skipped(case_id: impl Into<String>, seq: usize, reason: impl Into<String>) -> Self {
        Self::terminal(case_id, seq, Outcome::Skipped, None, Some(reason.into()))
    }

    /// Set the measured duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    fn terminal(
        case_id: impl Into<String>,
        seq: usize,
        outcome: Outcome,
        diagnostic: Option<Diagnostic>,
        skip_reason: Option<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            seq,
            outcome,
            diagnostic,
            skip_reason,
            duration_ms: 0,
        }
    }
}

/// Aggregate counters over a run's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total cases resolved (run + skipped).
    pub total: usize,
    /// Cases that passed.
    pub passed: usize,
    /// Cases whose result did not satisfy the expectation.
    pub failed: usize,
    /// Cases whose operation raised or timed out.
    pub errors: usize,
    /// Cases withheld by the exclusion filter.
    pub skipped: usize,
    /// Individual results in registration order.
    pub results: Vec<ExecutionResult>,
}

impl RunSummary {
    /// Build a summary, restoring registration order by sequence number.
    #[must_use]
    pub fn from_results(mut results: Vec<ExecutionResult>) -> Self {
        results.sort_by_key(|r| r.seq);
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Pass),
            failed: count(Outcome::Fail),
            errors: count(Outcome::Error),
            skipped: count(Outcome::Skipped),
            results,
        }
    }

    /// True when no case failed or errored. Skipped cases do not count
    /// against a green run.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Outcome::Pass).unwrap(), "\"pass\"");
        assert_eq!(
            serde_json::to_string(&Outcome::Skipped).unwrap(),
            "\"skipped\""
        );
    }

    #[test]
    fn summary_restores_registration_order() {
        let results = vec![
            ExecutionResult::pass("c", 2),
            ExecutionResult::pass("a", 0),
            ExecutionResult::skipped("b", 1, "hangs"),
        ];
        let summary = RunSummary::from_results(results);
        let ids: Vec<&str> = summary.results.iter().map(|r| r.case_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.skipped, 1);
        assert!(summary.all_passed());
    }

    #[test]
    fn skips_do_not_break_a_green_run_but_errors_do() {
        let green = RunSummary::from_results(vec![ExecutionResult::skipped("x", 0, "hangs")]);
        assert!(green.all_passed());

        let red = RunSummary::from_results(vec![ExecutionResult::error("y", 0, "raised")]);
        assert!(!red.all_passed());
        assert_eq!(red.errors, 1);
    }

    #[test]
    fn error_result_carries_failure_description() {
        let result = ExecutionResult::error("bad_case", 3, "denominator must not be zero");
        let diagnostic = result.diagnostic.expect("error results carry diagnostics");
        assert_eq!(
            diagnostic.failure.as_deref(),
            Some("denominator must not be zero")
        );
        assert!(result.outcome.is_failure());
    }
}
