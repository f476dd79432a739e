//! Conformance harness for the specrun engine.
//!
//! This crate provides:
//! - Execution loop: failure-isolated, optionally parallel, deadline-aware
//! - Report generation: human-readable + machine-readable run reports
//! - Structured logging: JSONL audit trail with artifact digests
//! - Reference subject: a built-in implementation under test for smoke runs

#![forbid(unsafe_code)]

pub mod diff;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod subject;

pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use subject::ReferenceSubject;
