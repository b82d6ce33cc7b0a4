//! Resolving and persisting differences between recorded commits.

use super::result::{diff_hashes, DependencyDiff};
use crate::error::{ErrorContext, Result};
use crate::ledger::Retriever;
use crate::model::DependencyHash;
use crate::store::{DocType, DocumentStore, DocumentStoreExt};
use crate::utils::short_sha;
use chrono::Utc;
use std::sync::Arc;

/// Computes [`DependencyDiff`]s from ledger contents
#[derive(Clone)]
pub struct DiffEngine {
    store: Arc<dyn DocumentStore>,
    retriever: Retriever,
}

impl DiffEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            retriever: Retriever::new(Arc::clone(&store)),
            store,
        }
    }

    /// Diff two recorded shas of one repository. Each side resolves in at most one hop.
    pub fn diff_shas(&self, full_name: &str, old_sha: &str, new_sha: &str) -> Result<DependencyDiff> {
        let (_, _, old) = self
            .retriever
            .hashes_by_sha(full_name, old_sha)
            .with_context(|| format!("resolving old side {}", short_sha(old_sha)))?;
        let (ref_name, _, new) = self
            .retriever
            .hashes_by_sha(full_name, new_sha)
            .with_context(|| format!("resolving new side {}", short_sha(new_sha)))?;
        let mut diff = self.diff_hash_lists(full_name, old_sha, new_sha, &old, &new)?;
        diff.ref_name = Some(ref_name);
        Ok(diff)
    }

    /// Diff the tips of two refs
    pub fn diff_refs(&self, full_name: &str, old_ref: &str, new_ref: &str) -> Result<DependencyDiff> {
        let old_tip = self.retriever.ref_tip(full_name, old_ref)?;
        let new_tip = self.retriever.ref_tip(full_name, new_ref)?;
        self.diff_shas(full_name, &old_tip, &new_tip)
    }

    /// Diff two hash lists already in hand, resolving only the changed hashes
    pub fn diff_hash_lists(
        &self,
        full_name: &str,
        old_sha: &str,
        new_sha: &str,
        old: &[DependencyHash],
        new: &[DependencyHash],
    ) -> Result<DependencyDiff> {
        let changes = diff_hashes(old, new);
        let (added, mut unresolved) = self.retriever.resolve_hashes(&changes.added)?;
        let (removed, unresolved_removed) = self.retriever.resolve_hashes(&changes.removed)?;
        unresolved.extend(unresolved_removed);
        unresolved.sort();

        Ok(DependencyDiff {
            repository: full_name.to_string(),
            ref_name: None,
            old_sha: old_sha.to_string(),
            new_sha: new_sha.to_string(),
            added,
            removed,
            unresolved,
            created_at: Utc::now(),
        })
    }

    /// Persist a difference document; an existing one for the same pair is kept
    pub fn record(&self, diff: &DependencyDiff) -> Result<bool> {
        let id = diff.doc_id();
        self.store
            .create_or_skip_as(DocType::Difference, &id, diff)
            .with_context(|| format!("writing difference {id}"))
    }

    /// Previously persisted difference between two shas
    pub fn load(&self, full_name: &str, old_sha: &str, new_sha: &str) -> Result<Option<DependencyDiff>> {
        let id = format!(
            "{}@{old_sha}..{new_sha}",
            crate::utils::repository_doc_id(full_name)
        );
        self.store
            .get_as(DocType::Difference, &id)
            .with_context(|| format!("loading difference {id}"))
    }
}
