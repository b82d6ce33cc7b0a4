//! Diff result types.

use crate::model::{Dependency, DependencyHash};
use crate::utils::repository_doc_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Added and removed hashes between two hash lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashDiff {
    pub added: Vec<DependencyHash>,
    pub removed: Vec<DependencyHash>,
}

impl HashDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// `added = new - old`, `removed = old - new`, both sorted.
#[must_use]
pub fn diff_hashes(old: &[DependencyHash], new: &[DependencyHash]) -> HashDiff {
    let old: BTreeSet<&DependencyHash> = old.iter().collect();
    let new: BTreeSet<&DependencyHash> = new.iter().collect();
    HashDiff {
        added: new.difference(&old).map(|h| (*h).clone()).collect(),
        removed: old.difference(&new).map(|h| (*h).clone()).collect(),
    }
}

/// Resolved difference between two recorded commits of one repository.
///
/// Also the persisted difference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDiff {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    pub old_sha: String,
    pub new_sha: String,
    pub added: Vec<Dependency>,
    pub removed: Vec<Dependency>,
    /// Changed hashes whose dependency document could not be read yet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<DependencyHash>,
    pub created_at: DateTime<Utc>,
}

impl DependencyDiff {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.unresolved.is_empty()
    }

    /// Store id of the difference document
    #[must_use]
    pub fn doc_id(&self) -> String {
        format!(
            "{}@{}..{}",
            repository_doc_id(&self.repository),
            self.old_sha,
            self.new_sha
        )
    }

    /// One-line summary for logs and terminal output
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} {}..{}: +{} -{}",
            self.repository,
            crate::utils::short_sha(&self.old_sha),
            crate::utils::short_sha(&self.new_sha),
            self.added.len(),
            self.removed.len()
        );
        if !self.unresolved.is_empty() {
            summary.push_str(&format!(" ({} unresolved)", self.unresolved.len()));
        }
        summary
    }
}
