//! Stage 2: check out a commit, parse its manifests and store its dependencies.

use super::task::IngestTask;
use crate::error::{ErrorContext, LedgerError, Result};
use crate::git::{Checkout, GitCollaborator};
use crate::history::HistorySnapshot;
use crate::model::{Dependency, DependencyDocument, DependencyHash, Scan};
use crate::parsers::ParserRegistry;
use crate::store::{DocType, DocumentStore, DocumentStoreExt};
use crate::utils::short_sha;
use chrono::Utc;
use rayon::prelude::*;
use std::path::Path;

/// A scanned commit on its way to the commit stage
#[derive(Debug, Clone)]
pub struct ResolvedScan {
    pub task: IngestTask,
    pub scan: Scan,
    /// Sorted hash list of `scan.dependencies`
    pub hashes: Vec<DependencyHash>,
    pub history: Option<HistorySnapshot>,
}

/// Parse every manifest under `root` into a [`Scan`] of `full_name` at `sha`
pub fn scan_checkout(
    parsers: &ParserRegistry,
    root: &Path,
    full_name: &str,
    sha: &str,
    refs: Vec<String>,
    include_test: bool,
) -> Result<(Scan, Vec<DependencyHash>)> {
    let manifests = parsers
        .scan_directory(root, include_test)
        .with_context(|| format!("scanning {full_name}@{}", short_sha(sha)))?;
    let hashes = manifests.hashes();
    let scan = Scan {
        repo_full_name: full_name.to_string(),
        sha: sha.to_string(),
        refs,
        dependencies: manifests.dependencies,
        issues: manifests.issues,
        files_scanned: manifests.files,
        timestamp: Utc::now(),
    };
    Ok((scan, hashes))
}

/// Create the dependency documents that do not exist yet; returns how many were new
pub fn write_dependency_documents(store: &dyn DocumentStore, dependencies: &[Dependency]) -> Result<usize> {
    let created: Vec<bool> = dependencies
        .par_iter()
        .map(|dep| {
            let hash = dep.hash();
            store
                .create_or_skip_as(DocType::Dependency, hash.as_str(), &DependencyDocument::from(dep))
                .with_context(|| format!("writing dependency {dep}"))
        })
        .collect::<Result<_>>()?;
    Ok(created.into_iter().filter(|c| *c).count())
}

/// Git listings for the history tree of a checkout
pub fn history_snapshot(git: &dyn GitCollaborator, checkout: &Checkout) -> Result<HistorySnapshot> {
    Ok(HistorySnapshot {
        commits: git.commits(checkout)?,
        branch_heads: git.branch_heads(checkout)?,
        default_branch: git.default_branch(checkout)?,
        tags: git.tags_at(checkout)?,
    })
}

pub(crate) struct ResolveStage<'a> {
    pub git: &'a dyn GitCollaborator,
    pub parsers: &'a ParserRegistry,
    pub store: &'a dyn DocumentStore,
    pub include_test: bool,
    pub track_history: bool,
}

impl ResolveStage<'_> {
    pub(crate) fn run(&self, task: IngestTask) -> Result<ResolvedScan> {
        let full_name = task.repository_full_name.as_str();
        let checkout = self.git.clone_repo(full_name)?;
        let sha = self.git.checkout(&checkout, &task.after_sha)?;
        if sha != task.after_sha {
            return Err(LedgerError::external_tool(
                "git",
                format!(
                    "checkout of {full_name}@{} resolved to {sha}",
                    task.after_sha
                ),
            ));
        }

        let mut refs = self.git.list_refs_at_sha(&checkout, &sha)?;
        if !refs.contains(&task.ref_name) {
            refs.push(task.ref_name.clone());
            refs.sort();
        }

        let (scan, hashes) = scan_checkout(
            self.parsers,
            checkout.path(),
            full_name,
            &sha,
            refs,
            self.include_test,
        )?;

        let history = if self.track_history {
            match history_snapshot(self.git, &checkout) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!(repo = full_name, error = %e, "history listing failed");
                    None
                }
            }
        } else {
            None
        };

        let created = write_dependency_documents(self.store, &scan.dependencies)?;
        tracing::debug!(
            repo = full_name,
            sha = short_sha(&sha),
            dependencies = scan.dependencies.len(),
            new_documents = created,
            "resolved scan"
        );

        Ok(ResolvedScan {
            task,
            scan,
            hashes,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ecosystem;
    use crate::store::MemoryStore;

    #[test]
    fn test_scan_checkout() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("requirements.txt"), "flask==2.0\nrequests\n").unwrap();

        let (scan, hashes) = scan_checkout(
            &ParserRegistry::declared_only(),
            tmp.path(),
            "acme/api",
            "abc",
            vec!["refs/heads/main".into()],
            false,
        )
        .unwrap();
        assert_eq!(scan.dependencies.len(), 2);
        assert_eq!(scan.files_scanned, vec!["requirements.txt"]);
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(hashes, scan.hashes());
    }

    #[test]
    fn test_dependency_documents_written_once() {
        let store = MemoryStore::new();
        let deps = vec![
            Dependency::new("flask", "2.0", Ecosystem::Python),
            Dependency::new("left-pad", "1.3.0", Ecosystem::Npm),
        ];
        assert_eq!(write_dependency_documents(&store, &deps).unwrap(), 2);
        assert_eq!(write_dependency_documents(&store, &deps).unwrap(), 0);
        assert_eq!(store.count(DocType::Dependency).unwrap(), 2);
    }
}
