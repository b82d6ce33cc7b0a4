//! Access to repository contents.
//!
//! Core code talks to git only through [`GitCollaborator`]. [`GitCli`] implements it by
//! shelling out to `git`; tests substitute in-process fakes.

mod cli;

pub use cli::{parse_branch_heads, parse_log, parse_show_ref, parse_tags, GitCli};

use crate::error::Result;
use crate::history::CommitInfo;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A working tree on disk.
///
/// Owned checkouts are temporary clones and are removed when dropped; borrowed ones
/// point at a directory someone else manages.
#[derive(Debug)]
pub struct Checkout {
    full_name: String,
    path: PathBuf,
    owned: bool,
}

impl Checkout {
    /// A temporary clone at `path`, removed on drop
    pub fn temporary(full_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            full_name: full_name.into(),
            path: path.into(),
            owned: true,
        }
    }

    /// An existing working tree that is left alone on drop
    pub fn borrowed(full_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            full_name: full_name.into(),
            path: path.into(),
            owned: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if !self.owned || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove checkout");
        }
    }
}

/// Everything the ingestion pipeline and history builder need from git
pub trait GitCollaborator: Send + Sync {
    /// Clone `org/name` into a fresh temporary checkout
    fn clone_repo(&self, full_name: &str) -> Result<Checkout>;

    /// Check out `rev` and return the sha now at HEAD
    fn checkout(&self, checkout: &Checkout, rev: &str) -> Result<String>;

    /// Refs pointing at `sha`, normalized to `refs/heads/..` and `refs/tags/..`
    fn list_refs_at_sha(&self, checkout: &Checkout, sha: &str) -> Result<Vec<String>>;

    /// Sha -> tag names, with annotated tags peeled to their commit
    fn tags_at(&self, checkout: &Checkout) -> Result<BTreeMap<String, Vec<String>>>;

    /// Every commit reachable from any ref, parents first-parent first
    fn commits(&self, checkout: &Checkout) -> Result<Vec<CommitInfo>>;

    /// Branch name -> head sha
    fn branch_heads(&self, checkout: &Checkout) -> Result<BTreeMap<String, String>>;

    /// The remote's default branch, when it can be determined
    fn default_branch(&self, _checkout: &Checkout) -> Result<Option<String>> {
        Ok(None)
    }
}
