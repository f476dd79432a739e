//! Expected-result predicates.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Default tolerance for approximate float comparison, applied both
/// absolutely and relative to the larger magnitude.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Expected-result predicate attached to a case.
///
/// `Exact` is the default equality predicate. `Approximate` covers results
/// that are inherently representation-dependent, such as an exact ratio
/// converted to a fixed-precision float. `Predicate` injects an arbitrary
/// comparator for anything the other two cannot express.
#[derive(Clone)]
pub enum Expectation {
    /// Exact value equality.
    Exact(Value),
    /// Tolerance comparison over the actual value read as `f64`.
    Approximate {
        /// Expected float value.
        expected: f64,
        /// Allowed absolute/relative deviation.
        tolerance: f64,
    },
    /// Injected comparator with a human-readable description.
    Predicate {
        /// Shown as the expected side of diagnostics.
        describe: String,
        /// Returns true when the actual value satisfies the expectation.
        check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    },
}

impl Expectation {
    /// Exact equality against `value`.
    #[must_use]
    pub fn exact(value: impl Into<Value>) -> Self {
        Self::Exact(value.into())
    }

    /// Approximate equality with [`DEFAULT_TOLERANCE`].
    #[must_use]
    pub fn approximate(expected: f64) -> Self {
        Self::within(expected, DEFAULT_TOLERANCE)
    }

    /// Approximate equality with an explicit tolerance.
    #[must_use]
    pub fn within(expected: f64, tolerance: f64) -> Self {
        Self::Approximate {
            expected,
            tolerance,
        }
    }

    /// Injected comparator.
    #[must_use]
    pub fn predicate(
        describe: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate {
            describe: describe.into(),
            check: Arc::new(check),
        }
    }

    /// Whether `actual` satisfies the expectation.
    #[must_use]
    pub fn is_satisfied_by(&self, actual: &Value) -> bool {
        match self {
            Self::Exact(expected) => expected == actual,
            Self::Approximate {
                expected,
                tolerance,
            } => actual
                .as_f64()
                .is_some_and(|got| approx_eq(*expected, got, *tolerance)),
            Self::Predicate { check, .. } => check(actual),
        }
    }

    /// Human-readable expected side for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Exact(value) => value.to_string(),
            Self::Approximate {
                expected,
                tolerance,
            } => format!("{expected} (tolerance {tolerance})"),
            Self::Predicate { describe, .. } => describe.clone(),
        }
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Self::Approximate {
                expected,
                tolerance,
            } => f
                .debug_struct("Approximate")
                .field("expected", expected)
                .field("tolerance", tolerance)
                .finish(),
            Self::Predicate { describe, .. } => f
                .debug_struct("Predicate")
                .field("describe", describe)
                .finish_non_exhaustive(),
        }
    }
}

fn approx_eq(expected: f64, actual: f64, tolerance: f64) -> bool {
    if expected == actual {
        // Also covers matching infinities.
        return true;
    }
    let diff = (expected - actual).abs();
    diff <= tolerance || diff <= tolerance * expected.abs().max(actual.abs())
}
