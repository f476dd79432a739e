//! Integration test: parallel report ordering and run idempotence.
//!
//! Run: cargo test -p specrun-harness --test run_determinism_test

use std::sync::Arc;

use serde_json::{Value, json};
use specrun_core::{Expectation, Outcome, SpecRegistry};
use specrun_harness::TestRunner;

fn numbered_registry(count: usize) -> SpecRegistry {
    let mut registry = SpecRegistry::new();
    for i in 0..count {
        let expectation = if i % 5 == 0 {
            // Every fifth case fails so outcome order is observable.
            Expectation::exact(json!(-1))
        } else {
            Expectation::exact(json!(i))
        };
        registry
            .register(
                format!("case_{i:03}"),
                Arc::new(move |_| Ok(json!(i))),
                Value::Null,
                expectation,
            )
            .unwrap();
    }
    registry
}

#[test]
fn parallel_results_come_back_in_registration_order() {
    let registry = numbered_registry(24);
    let cases: Vec<_> = registry.cases().cloned().collect();

    let results = TestRunner::new("parallel").with_workers(8).run(&cases);

    assert_eq!(results.len(), 24);
    let seqs: Vec<usize> = results.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, (0..24).collect::<Vec<_>>());
    let ids: Vec<&str> = results.iter().map(|r| r.case_id.as_str()).collect();
    assert_eq!(ids[0], "case_000");
    assert_eq!(ids[23], "case_023");
}

#[test]
fn repeated_runs_produce_identical_outcome_sequences() {
    let registry = numbered_registry(16);
    let cases: Vec<_> = registry.cases().cloned().collect();
    let runner = TestRunner::new("idempotence").with_workers(4);

    let first: Vec<Outcome> = runner.run(&cases).iter().map(|r| r.outcome).collect();
    let second: Vec<Outcome> = runner.run(&cases).iter().map(|r| r.outcome).collect();

    assert_eq!(first, second);
    assert_eq!(first.iter().filter(|o| **o == Outcome::Fail).count(), 4);
}

#[test]
fn worker_count_does_not_change_outcomes() {
    let registry = numbered_registry(12);
    let cases: Vec<_> = registry.cases().cloned().collect();

    let sequential: Vec<Outcome> = TestRunner::new("seq")
        .run(&cases)
        .iter()
        .map(|r| r.outcome)
        .collect();
    let parallel: Vec<Outcome> = TestRunner::new("par")
        .with_workers(6)
        .run(&cases)
        .iter()
        .map(|r| r.outcome)
        .collect();

    assert_eq!(sequential, parallel);
}
