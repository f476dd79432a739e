//! Spec registry: declarative case loading and registration.
//!
//! Parsing/registration and execution are strictly separated phases.
//! Nothing in this module ever invokes an operation; it only binds
//! operation names to the subject and stores the resulting closures.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::case::{Operation, TestCase};
use crate::error::RegistryError;
use crate::expect::{DEFAULT_TOLERANCE, Expectation};
use crate::subject::Subject;

/// A declarative spec source: one ordered record per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecSet {
    /// Schema version.
    pub version: String,
    /// Suite name. Case identifiers are qualified within it; the name
    /// itself is reporting metadata only.
    pub suite: String,
    /// Individual case declarations, in execution order.
    pub cases: Vec<SpecEntry>,
}

impl SpecSet {
    /// Parse a spec set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a spec set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|err| RegistryError::Parse {
            path: path.display().to_string(),
            detail: err.to_string(),
        })
    }
}

/// One declarative case entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Case identifier, unique within one load.
    pub name: String,
    /// Operation the subject resolves by name at invocation time.
    pub operation: String,
    /// Input values handed to the operation.
    #[serde(default)]
    pub inputs: Value,
    /// Expected-result declaration.
    pub expect: ExpectSpec,
}

/// Expected-result declaration: exact value or tolerance comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectSpec {
    /// Exact value equality.
    Exact {
        /// Expected value.
        value: Value,
    },
    /// Tolerance comparison for representation-dependent float results.
    Approximate {
        /// Expected float value.
        value: f64,
        /// Allowed deviation; defaults to [`DEFAULT_TOLERANCE`].
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl From<&ExpectSpec> for Expectation {
    fn from(spec: &ExpectSpec) -> Self {
        match spec {
            ExpectSpec::Exact { value } => Expectation::Exact(value.clone()),
            ExpectSpec::Approximate { value, tolerance } => Expectation::within(*value, *tolerance),
        }
    }
}

/// Holds the loaded cases of one suite in registration order.
///
/// Iteration is restartable: every call to [`SpecRegistry::cases`] yields
/// the same cases in the same order, since execution order matters for
/// diagnostics reproducibility.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    cases: Vec<Arc<TestCase>>,
    ids: HashSet<String>,
}

impl SpecRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a case under `id`.
    ///
    /// Fails fast with [`RegistryError::DuplicateIdentifier`] when `id` was
    /// already registered; the caller must treat the whole load as aborted,
    /// not keep a partial registry. The operation is stored, never invoked.
    ///
    /// The operation must be free of process-wide side effects visible to
    /// other cases; the `Send + Sync` bound on [`Operation`] is how that
    /// contract is enforced at the seam.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        operation: Operation,
        inputs: Value,
        expectation: Expectation,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if !self.ids.insert(id.clone()) {
            return Err(RegistryError::DuplicateIdentifier { id });
        }
        self.cases.push(Arc::new(TestCase {
            seq: self.cases.len(),
            id,
            inputs,
            expectation,
            operation,
        }));
        Ok(())
    }

    /// Bind every entry of `sets` against `subject` and register them in
    /// declaration order. Loading executes no test logic.
    pub fn from_sets(sets: &[SpecSet], subject: &Arc<dyn Subject>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for set in sets {
            for entry in &set.cases {
                let operation_name = entry.operation.clone();
                let subject = Arc::clone(subject);
                let operation: Operation =
                    Arc::new(move |inputs| subject.invoke(&operation_name, inputs));
                registry.register(
                    entry.name.clone(),
                    operation,
                    entry.inputs.clone(),
                    Expectation::from(&entry.expect),
                )?;
            }
        }
        Ok(registry)
    }

    /// Cases in registration order.
    pub fn cases(&self) -> impl Iterator<Item = &Arc<TestCase>> {
        self.cases.iter()
    }

    /// Registered identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|case| case.id.as_str())
    }

    /// Number of registered cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the registry holds no cases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
