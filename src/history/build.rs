//! Building history trees from commit listings.

use super::tree::{HistoryNode, HistoryTree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One commit as listed by the git collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    /// First parent first
    pub parents: Vec<String>,
}

impl CommitInfo {
    pub fn new(sha: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            sha: sha.into(),
            parents,
        }
    }
}

/// Branch order for lane assignment: the default branch, then the rest alphabetically
fn ordered_branches<'a>(
    branch_heads: &'a BTreeMap<String, String>,
    default_branch: Option<&str>,
) -> Vec<(&'a str, &'a str)> {
    let mut ordered: Vec<(&str, &str)> = Vec::with_capacity(branch_heads.len());
    if let Some(default) = default_branch {
        if let Some((name, head)) = branch_heads.get_key_value(default) {
            ordered.push((name.as_str(), head.as_str()));
        }
    }
    ordered.extend(
        branch_heads
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != default_branch)
            .map(|(name, head)| (name.as_str(), head.as_str())),
    );
    ordered
}

impl HistoryTree {
    /// Build a tree from a commit listing.
    ///
    /// Each branch claims the commits on its first-parent chain that no earlier branch
    /// claimed; the oldest commit it claims is the start of that branch. Commits reached by
    /// no branch keep an empty branch name. `tags` maps sha to tag names.
    #[must_use]
    pub fn from_commits(
        commits: &[CommitInfo],
        branch_heads: &BTreeMap<String, String>,
        default_branch: Option<&str>,
        tags: &BTreeMap<String, Vec<String>>,
    ) -> Self {
        let by_sha: HashMap<&str, &CommitInfo> =
            commits.iter().map(|c| (c.sha.as_str(), c)).collect();
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        let mut starts: Vec<&str> = Vec::new();

        for (branch, head) in ordered_branches(branch_heads, default_branch) {
            let mut cursor = by_sha.get(head).copied();
            let mut oldest = None;
            while let Some(commit) = cursor {
                if claimed.contains_key(commit.sha.as_str()) {
                    break;
                }
                claimed.insert(commit.sha.as_str(), branch);
                oldest = Some(commit.sha.as_str());
                cursor = commit
                    .parents
                    .first()
                    .and_then(|p| by_sha.get(p.as_str()).copied());
            }
            starts.extend(oldest);
        }

        let mut tree = Self::new();
        for commit in commits {
            let mut node = HistoryNode::new(commit.sha.clone(), commit.parents.clone());
            if let Some(branch) = claimed.get(commit.sha.as_str()) {
                node.branch = (*branch).to_string();
            }
            node.is_start_of_branch = starts.contains(&commit.sha.as_str());
            if let Some(names) = tags.get(&commit.sha) {
                node.tags = names.clone();
                node.tags.sort();
                node.tags.dedup();
            }
            tree.insert(node);
        }
        tree
    }

    /// Fold a fresh listing into this tree.
    ///
    /// New commits are inserted and new tags are added to known commits; the branch of a
    /// known commit never changes. Returns whether anything changed, i.e. whether the
    /// tree needs persisting.
    pub fn merge_commits(
        &mut self,
        commits: &[CommitInfo],
        branch_heads: &BTreeMap<String, String>,
        default_branch: Option<&str>,
        tags: &BTreeMap<String, Vec<String>>,
    ) -> bool {
        let fresh = Self::from_commits(commits, branch_heads, default_branch, tags);
        let mut changed = false;
        for node in fresh.nodes() {
            match self.get_mut(&node.sha) {
                Some(existing) => {
                    for tag in &node.tags {
                        if !existing.tags.contains(tag) {
                            existing.tags.push(tag.clone());
                            changed = true;
                        }
                    }
                    existing.tags.sort();
                }
                None => {
                    self.insert(node.clone());
                    changed = true;
                }
            }
        }
        changed
    }
}
