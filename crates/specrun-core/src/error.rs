//! Error taxonomy for suite loading and execution.
//!
//! Load-time errors (`RegistryError`, `ExclusionError`) are fatal: a corrupt
//! registry or skip list makes every downstream result untrustworthy, so the
//! run aborts before any case executes. Execution-time failures
//! (`SubjectError`) are isolated per case and captured as an `error` outcome.

use thiserror::Error;

/// Errors raised while registering or loading spec cases.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two cases were registered under the same identifier. Identifiers must
    /// be unique within one load; the load aborts rather than keeping a
    /// partial registry.
    #[error("duplicate test identifier `{id}`")]
    DuplicateIdentifier {
        /// The identifier registered twice.
        id: String,
    },

    /// A spec source did not parse as the expected structured format.
    #[error("spec source `{path}` is malformed: {detail}")]
    Parse {
        /// Source path (or `<inline>` for in-memory sources).
        path: String,
        /// Parser diagnostic.
        detail: String,
    },

    /// A spec source could not be read.
    #[error("failed to read spec source `{path}`")]
    Io {
        /// Source path.
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading an exclusion source.
#[derive(Debug, Error)]
pub enum ExclusionError {
    /// An exclusion line is unusable: no reason text, or the same identifier
    /// listed again under a different reason. The latter is ambiguous intent
    /// and must not be resolved by silently keeping the last entry.
    #[error("malformed exclusion entry for `{id}`: {detail}")]
    MalformedEntry {
        /// The offending identifier (or raw line when no identifier parsed).
        id: String,
        /// What was wrong with the entry.
        detail: String,
    },

    /// An exclusion source could not be read.
    #[error("failed to read exclusion source `{path}`")]
    Io {
        /// Source path.
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure raised by the implementation under test while executing an
/// operation. Never fatal to the run: the execution loop records it as the
/// case's `error` outcome and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    /// The subject does not expose the named operation.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// The declared inputs do not fit the operation's signature.
    #[error("invalid inputs for `{operation}`: {detail}")]
    InvalidInputs {
        /// Operation whose inputs were rejected.
        operation: String,
        /// What was wrong with them.
        detail: String,
    },

    /// The operation ran and raised.
    #[error("{0}")]
    Raised(String),
}

impl SubjectError {
    /// Shorthand for a raised failure with a formatted description.
    #[must_use]
    pub fn raised(detail: impl Into<String>) -> Self {
        Self::Raised(detail.into())
    }
}
