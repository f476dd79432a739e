//! Test case model.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SubjectError;
use crate::expect::Expectation;

/// Operation bound to a case, invoked with the case's declared inputs.
///
/// Operations must not mutate process-wide state visible to other cases;
/// the whole design relies on cross-case independence. The `Send + Sync`
/// bound rejects non-thread-safe shared state at the seam, and the runner
/// is free to execute cases on parallel workers because of it.
pub type Operation = Arc<dyn Fn(&Value) -> Result<Value, SubjectError> + Send + Sync>;

/// A single runnable conformance case.
///
/// Immutable once loaded. Owned by the registry that parsed it and handed
/// to workers as `Arc<TestCase>`.
pub struct TestCase {
    /// Qualified identifier, unique within a suite.
    pub id: String,
    /// Stable registration index. Report order is restored by sorting on
    /// it, never by serializing execution.
    pub seq: usize,
    /// Input values passed to the operation.
    pub inputs: Value,
    /// Expected-result predicate.
    pub expectation: Expectation,
    /// The operation under test.
    pub operation: Operation,
}

impl TestCase {
    /// Invoke the operation with the declared inputs.
    pub fn invoke(&self) -> Result<Value, SubjectError> {
        (self.operation)(&self.inputs)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("seq", &self.seq)
            .field("inputs", &self.inputs)
            .field("expectation", &self.expectation)
            .finish_non_exhaustive()
    }
}
