//! Difference against the previous tip after a commit lands.

use crate::diff::{DependencyDiff, DiffEngine};
use crate::error::Result;
use crate::utils::short_sha;

/// A commit waiting to be diffed against the tip it replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub full_name: String,
    pub previous_tip: String,
    pub sha: String,
}

impl DiffRequest {
    pub fn new(full_name: impl Into<String>, previous_tip: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            previous_tip: previous_tip.into(),
            sha: sha.into(),
        }
    }
}

/// Diff `previous_tip..sha` of `full_name` and persist it.
///
/// Returns the diff and whether a new difference document was written.
pub fn compare_with_previous(
    engine: &DiffEngine,
    full_name: &str,
    previous_tip: &str,
    sha: &str,
) -> Result<(DependencyDiff, bool)> {
    let diff = engine.diff_shas(full_name, previous_tip, sha)?;
    let written = engine.record(&diff)?;
    if diff.has_changes() {
        tracing::info!(
            repo = full_name,
            from = short_sha(previous_tip),
            to = short_sha(sha),
            added = diff.added.len(),
            removed = diff.removed.len(),
            "dependencies changed"
        );
    } else {
        tracing::debug!(repo = full_name, to = short_sha(sha), "no dependency changes");
    }
    Ok((diff, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::model::{Dependency, Ecosystem, Scan};
    use crate::pipeline::resolve_stage::write_dependency_documents;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn record(ledger: &Ledger, sha: &str, deps: Vec<Dependency>) {
        write_dependency_documents(ledger.store().as_ref(), &deps).unwrap();
        let scan = Scan {
            repo_full_name: "acme/api".into(),
            sha: sha.into(),
            refs: vec![],
            dependencies: deps,
            issues: vec![],
            files_scanned: vec![],
            timestamp: Utc::now(),
        };
        let hashes = scan.hashes();
        ledger.record_scan(&scan, "refs/heads/main", &hashes).unwrap();
    }

    #[test]
    fn test_compare_records_once() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store.clone());
        record(&ledger, "a1", vec![Dependency::new("flask", "1.0", Ecosystem::Python)]);
        record(&ledger, "a2", vec![Dependency::new("flask", "2.0", Ecosystem::Python)]);

        let engine = DiffEngine::new(store);
        let (diff, written) = compare_with_previous(&engine, "acme/api", "a1", "a2").unwrap();
        assert!(written);
        assert_eq!(diff.added[0].version, "2.0");
        assert_eq!(diff.removed[0].version, "1.0");

        let (_, written) = compare_with_previous(&engine, "acme/api", "a1", "a2").unwrap();
        assert!(!written);
    }
}
