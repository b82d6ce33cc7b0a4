//! Per-repository commit history.
//!
//! A [`HistoryTree`] is the commit DAG of one repository annotated with branch and tag
//! names. It is built from git listings ([`HistoryTree::from_commits`]), grown as new
//! commits appear ([`HistoryTree::merge_commits`]) and persisted as a history document
//! only when that adds something. The tree drives two things: the visualization
//! [`layout`] and [`plan_backfill`], which finds tagged commits that still need a scan.
//!
//! Node weights are scratch space for traversal passes. A tree must not be traversed
//! from two threads at once; callers serialize per repository.

mod backfill;
mod build;
mod layout;
mod tree;

pub use backfill::plan_backfill;
pub use build::CommitInfo;
pub use layout::{layout, Layout, LayoutEdge, LayoutNode, NodeGroup, RecordedScans, ScanPresence};
pub use tree::{Direction, HistoryNode, HistoryTree};

use crate::error::{ErrorContext, Result};
use crate::store::{DocType, DocumentStore, DocumentStoreExt};
use crate::utils::repository_doc_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted history of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    pub tree: HistoryTree,
    pub updated_at: DateTime<Utc>,
}

/// Git listings a history update is built from
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub commits: Vec<CommitInfo>,
    /// Branch name -> head sha
    pub branch_heads: BTreeMap<String, String>,
    pub default_branch: Option<String>,
    /// Sha -> tag names
    pub tags: BTreeMap<String, Vec<String>>,
}

pub fn load_history(store: &dyn DocumentStore, full_name: &str) -> Result<Option<HistoryDocument>> {
    store
        .get_as(DocType::History, &repository_doc_id(full_name))
        .with_context(|| format!("loading history of {full_name}"))
}

/// Merge `snapshot` into the stored tree, writing it back only if it changed.
///
/// Returns whether the stored document was written.
pub fn update_history(
    store: &dyn DocumentStore,
    full_name: &str,
    snapshot: &HistorySnapshot,
) -> Result<bool> {
    let existing = load_history(store, full_name)?;
    let default_branch = snapshot
        .default_branch
        .clone()
        .or_else(|| existing.as_ref().and_then(|doc| doc.default_branch.clone()));
    let mut tree = existing.map(|doc| doc.tree).unwrap_or_default();

    let changed = tree.merge_commits(
        &snapshot.commits,
        &snapshot.branch_heads,
        default_branch.as_deref(),
        &snapshot.tags,
    );
    if !changed {
        tracing::debug!(repository = full_name, "history unchanged");
        return Ok(false);
    }

    let doc = HistoryDocument {
        repository: full_name.to_string(),
        default_branch,
        tree,
        updated_at: Utc::now(),
    };
    store
        .put_as(DocType::History, &repository_doc_id(full_name), &doc)
        .with_context(|| format!("writing history of {full_name}"))?;
    tracing::info!(repository = full_name, commits = doc.tree.len(), "history updated");
    Ok(true)
}
