//! Boundary to the implementation under test.

use serde_json::Value;

use crate::error::SubjectError;

/// The implementation under test, reachable only through named operations.
///
/// The engine never inspects the subject's internals: cases bind an
/// operation name at load time and invoke it with their declared inputs at
/// run time. Whatever the subject computes behind that seam is its own
/// business.
pub trait Subject: Send + Sync {
    /// Resolve and execute `operation` with `inputs`.
    fn invoke(&self, operation: &str, inputs: &Value) -> Result<Value, SubjectError>;

    /// Capability query: whether `value` uses the subject's inline
    /// small-integer storage tier, as opposed to heap arbitrary-precision
    /// storage. Returns `None` when the subject does not expose the
    /// capability. The engine treats the answer as an opaque boolean and
    /// never reimplements the classification.
    fn uses_inline_storage(&self, _value: &Value) -> Option<bool> {
        None
    }
}
