//! Test execution engine.
//!
//! Pulls each non-excluded case, invokes it inside a failure-isolating
//! boundary, compares actual vs expected through the case's predicate, and
//! emits exactly one result per case. Single pass; nothing is retried, no
//! operation is assumed safe to re-invoke.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use specrun_core::{Diagnostic, ExecutionResult, SkippedCase, SubjectError, TestCase};

use crate::diff;

/// Runs partitioned cases and collects one result per case.
///
/// Per-case lifecycle is `pending -> running -> {pass|fail|error}`, or
/// `pending -> skipped` for withheld cases, which never start running.
/// Terminal outcomes are final; no case resolves twice.
pub struct TestRunner {
    /// Name of the test campaign, carried into reports and logs.
    pub campaign: String,
    workers: usize,
    deadline: Option<Duration>,
}

impl TestRunner {
    /// Create a sequential runner with no deadline.
    #[must_use]
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            workers: 1,
            deadline: None,
        }
    }

    /// Execute with `workers` parallel workers. Cases are independent by
    /// contract, so execution order is unconstrained; report order is
    /// restored from sequence numbers, never by serializing execution.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Convert any case running longer than `deadline` into an `error`
    /// outcome instead of letting a hung case stall the whole run.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Execute all cases and return results sorted back into registration
    /// order.
    #[must_use]
    pub fn run(&self, to_run: &[Arc<TestCase>]) -> Vec<ExecutionResult> {
        let mut results = if self.workers > 1 {
            self.run_parallel(to_run)
        } else {
            to_run.iter().map(|case| self.execute(case)).collect()
        };
        results.sort_by_key(|r| r.seq);
        results
    }

    /// Results for withheld cases, tagged `skipped` with the stored reason.
    /// Their operations are never invoked, regardless of what they would
    /// have returned.
    #[must_use]
    pub fn skipped_results(to_skip: &[SkippedCase]) -> Vec<ExecutionResult> {
        to_skip
            .iter()
            .map(|skip| ExecutionResult::skipped(&skip.case.id, skip.case.seq, &skip.reason))
            .collect()
    }

    fn run_parallel(&self, to_run: &[Arc<TestCase>]) -> Vec<ExecutionResult> {
        let cursor = AtomicUsize::new(0);
        let sink = Mutex::new(Vec::with_capacity(to_run.len()));
        thread::scope(|scope| {
            for _ in 0..self.workers {
                scope.spawn(|| {
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = to_run.get(index) else {
                            break;
                        };
                        let result = self.execute(case);
                        sink.lock().push(result);
                    }
                });
            }
        });
        sink.into_inner()
    }

    fn execute(&self, case: &Arc<TestCase>) -> ExecutionResult {
        let started = Instant::now();
        let invocation = match self.deadline {
            Some(deadline) => invoke_with_deadline(case, deadline),
            None => invoke_isolated(case),
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match invocation {
            Invocation::Completed(Ok(actual)) => {
                if case.expectation.is_satisfied_by(&actual) {
                    ExecutionResult::pass(&case.id, case.seq)
                } else {
                    let expected = case.expectation.describe();
                    let actual = actual.to_string();
                    let diff = diff::render_diff(&expected, &actual);
                    ExecutionResult::fail(
                        &case.id,
                        case.seq,
                        Diagnostic {
                            expected: Some(expected),
                            actual: Some(actual),
                            failure: None,
                            diff: Some(diff),
                        },
                    )
                }
            }
            Invocation::Completed(Err(err)) => {
                ExecutionResult::error(&case.id, case.seq, err.to_string())
            }
            Invocation::Panicked(description) => {
                ExecutionResult::error(&case.id, case.seq, description)
            }
            Invocation::TimedOut(deadline) => ExecutionResult::error(
                &case.id,
                case.seq,
                format!("timeout: exceeded {}ms", deadline.as_millis()),
            ),
        };
        result.with_duration_ms(duration_ms)
    }
}

enum Invocation {
    Completed(Result<Value, SubjectError>),
    Panicked(String),
    TimedOut(Duration),
}

/// Invoke inside the failure-isolating boundary: a panicking operation is
/// captured as an error description and never unwinds into the loop.
fn invoke_isolated(case: &Arc<TestCase>) -> Invocation {
    match panic::catch_unwind(AssertUnwindSafe(|| case.invoke())) {
        Ok(result) => Invocation::Completed(result),
        Err(payload) => Invocation::Panicked(panic_description(&payload)),
    }
}

/// Run the case on a watchdogged thread. On a deadline breach the thread is
/// abandoned, never joined: a hung case must not stall the run.
fn invoke_with_deadline(case: &Arc<TestCase>, deadline: Duration) -> Invocation {
    let (tx, rx) = mpsc::channel();
    let case = Arc::clone(case);
    thread::spawn(move || {
        let _ = tx.send(invoke_isolated(&case));
    });
    match rx.recv_timeout(deadline) {
        Ok(invocation) => invocation,
        Err(mpsc::RecvTimeoutError::Timeout) => Invocation::TimedOut(deadline),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Invocation::Panicked(String::from("operation worker terminated without a result"))
        }
    }
}

fn panic_description(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        String::from("panicked with a non-string payload")
    }
}
