//! Exclusion filter: declarative skip list applied before execution.
//!
//! Entries map a case identifier to a human-readable reason. Matching is
//! exact-identifier lookup only; parameterized cases are expected to be
//! pre-expanded into composite string keys such as
//! `test_thread_size:win32/registry`, which stay opaque single strings.
//! The reason is reporting text, never parsed for control flow.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::case::TestCase;
use crate::error::ExclusionError;
use crate::registry::SpecRegistry;

/// One exclusion: identifier plus free-text reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionEntry {
    /// Case identifier the entry suppresses.
    pub id: String,
    /// Why the case is withheld.
    pub reason: String,
}

/// A case withheld from execution, together with its stored reason.
#[derive(Debug, Clone)]
pub struct SkippedCase {
    /// The withheld case.
    pub case: Arc<TestCase>,
    /// Stored exclusion reason.
    pub reason: String,
}

/// Output of [`ExclusionFilter::partition`]. Original ordering is
/// preserved within both groups.
#[derive(Debug, Default)]
pub struct Partition {
    /// Cases the runner will execute.
    pub to_run: Vec<Arc<TestCase>>,
    /// Cases withheld with their reasons.
    pub to_skip: Vec<SkippedCase>,
}

/// Declarative mapping from case identifier to exclusion reason.
#[derive(Debug, Default)]
pub struct ExclusionFilter {
    entries: Vec<ExclusionEntry>,
    by_id: HashMap<String, usize>,
}

impl ExclusionFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry.
    ///
    /// Repeating an identical entry is accepted. The same identifier under
    /// a *different* reason is ambiguous intent and fails with
    /// [`ExclusionError::MalformedEntry`]: silently keeping the last one
    /// would mask accidental re-exclusion of a fixed case under a new
    /// reason.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), ExclusionError> {
        let id = id.into();
        let reason = reason.into();
        if let Some(&index) = self.by_id.get(&id) {
            let existing = &self.entries[index].reason;
            if *existing == reason {
                return Ok(());
            }
            return Err(ExclusionError::MalformedEntry {
                id,
                detail: format!("listed twice with conflicting reasons (`{existing}` vs `{reason}`)"),
            });
        }
        self.by_id.insert(id.clone(), self.entries.len());
        self.entries.push(ExclusionEntry { id, reason });
        Ok(())
    }

    /// Parse the line format: one `identifier reason…` pair per line, the
    /// identifier being the first whitespace-delimited token. Blank lines
    /// and `#` comments are ignored.
    pub fn from_lines(source: &str) -> Result<Self, ExclusionError> {
        let mut filter = Self::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((id, reason)) = line.split_once(char::is_whitespace) else {
                return Err(ExclusionError::MalformedEntry {
                    id: line.to_string(),
                    detail: format!("line {}: missing reason", index + 1),
                });
            };
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(ExclusionError::MalformedEntry {
                    id: id.to_string(),
                    detail: format!("line {}: missing reason", index + 1),
                });
            }
            filter.insert(id, reason).map_err(|err| match err {
                ExclusionError::MalformedEntry { id, detail } => ExclusionError::MalformedEntry {
                    id,
                    detail: format!("line {}: {detail}", index + 1),
                },
                other => other,
            })?;
        }
        Ok(filter)
    }

    /// Load the line format from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ExclusionError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExclusionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_lines(&content)
    }

    /// Stored reason for `id`, if excluded.
    #[must_use]
    pub fn reason_for(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .map(|&index| self.entries[index].reason.as_str())
    }

    /// All entries in source order.
    #[must_use]
    pub fn entries(&self) -> &[ExclusionEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the filter holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split `cases` into run and skip groups before execution, preserving
    /// the original ordering within each group.
    #[must_use]
    pub fn partition(&self, cases: impl IntoIterator<Item = Arc<TestCase>>) -> Partition {
        let mut partition = Partition::default();
        for case in cases {
            match self.reason_for(&case.id) {
                Some(reason) => partition.to_skip.push(SkippedCase {
                    reason: reason.to_string(),
                    case,
                }),
                None => partition.to_run.push(case),
            }
        }
        partition
    }

    /// Entries that match no case in `registry`. A stale entry is a
    /// configuration warning, not a fatal error: the skip list commonly
    /// lags behind suite changes.
    #[must_use]
    pub fn unmatched(&self, registry: &SpecRegistry) -> Vec<&ExclusionEntry> {
        let known: std::collections::HashSet<&str> = registry.ids().collect();
        self.entries
            .iter()
            .filter(|entry| !known.contains(entry.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::Expectation;
    use serde_json::{Value, json};

    fn case(id: &str, seq: usize) -> Arc<TestCase> {
        Arc::new(TestCase {
            id: id.to_string(),
            seq,
            inputs: Value::Null,
            expectation: Expectation::exact(json!(null)),
            operation: Arc::new(|_| Ok(Value::Null)),
        })
    }

    #[test]
    fn partition_preserves_order_within_both_groups() {
        let filter = ExclusionFilter::from_lines(
            "autoload_parallel_race hangs\n\
             no_memory_leak no working memory-leak assertion\n",
        )
        .unwrap();

        let cases = vec![
            case("first", 0),
            case("autoload_parallel_race", 1),
            case("second", 2),
            case("no_memory_leak", 3),
            case("third", 4),
        ];
        let partition = filter.partition(cases);

        let run_ids: Vec<&str> = partition.to_run.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(run_ids, ["first", "second", "third"]);

        let skip_ids: Vec<&str> = partition
            .to_skip
            .iter()
            .map(|s| s.case.id.as_str())
            .collect();
        assert_eq!(skip_ids, ["autoload_parallel_race", "no_memory_leak"]);
        assert_eq!(partition.to_skip[0].reason, "hangs");
    }

    #[test]
    fn composite_keys_stay_opaque_strings() {
        let filter = ExclusionFilter::from_lines(
            "test_thread_size:win32/registry win32 not available on unix\n\
             test_thread_size:jars/gemspec_pom not meant to be loaded on its own\n",
        )
        .unwrap();

        assert_eq!(
            filter.reason_for("test_thread_size:win32/registry"),
            Some("win32 not available on unix")
        );
        // No decomposition of the parameter portion: the bare prefix does
        // not match.
        assert_eq!(filter.reason_for("test_thread_size"), None);
    }

    #[test]
    fn conflicting_duplicate_is_malformed() {
        let err = ExclusionFilter::from_lines(
            "dup_case flaky on ci\n\
             dup_case hangs\n",
        )
        .unwrap_err();
        match err {
            ExclusionError::MalformedEntry { id, detail } => {
                assert_eq!(id, "dup_case");
                assert!(detail.contains("line 2"));
                assert!(detail.contains("conflicting"));
            }
            other => panic!("expected MalformedEntry, got {other:?}"),
        }
    }

    #[test]
    fn identical_duplicate_is_idempotent() {
        let filter = ExclusionFilter::from_lines(
            "same_case hangs\n\
             same_case hangs\n",
        )
        .unwrap();
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn missing_reason_is_malformed() {
        let err = ExclusionFilter::from_lines("lonely_identifier\n").unwrap_err();
        assert!(matches!(
            err,
            ExclusionError::MalformedEntry { id, .. } if id == "lonely_identifier"
        ));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let filter = ExclusionFilter::from_lines(
            "# known-bad upstream cases\n\
             \n\
             slow_case requires rake and test runs without rake available\n",
        )
        .unwrap();
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn unmatched_entries_are_warnings_not_errors() {
        let mut registry = SpecRegistry::new();
        registry
            .register(
                "present",
                Arc::new(|_| Ok(Value::Null)),
                Value::Null,
                Expectation::exact(json!(null)),
            )
            .unwrap();

        let filter = ExclusionFilter::from_lines(
            "present hangs\n\
             long_gone fixed upstream\n",
        )
        .unwrap();

        let stale: Vec<&str> = filter
            .unmatched(&registry)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(stale, ["long_gone"]);
    }
}
