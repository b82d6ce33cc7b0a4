//! [`GitCollaborator`] backed by the `git` executable.

use super::{Checkout, GitCollaborator};
use crate::config::GitConfig;
use crate::error::{LedgerError, Result};
use crate::history::CommitInfo;
use crate::utils::{repository_doc_id, run_with_timeout};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static CHECKOUT_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct GitCli {
    executable: String,
    remote_base: String,
    work_dir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(config: &GitConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            remote_base: config.remote_base.trim_end_matches('/').to_string(),
            work_dir: config.work_dir.clone().unwrap_or_else(std::env::temp_dir),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Clone source for `org/name`
    #[must_use]
    pub fn remote_url(&self, full_name: &str) -> String {
        format!("{}/{full_name}", self.remote_base)
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let dir_arg = dir.to_string_lossy();
        let mut full: Vec<&str> = vec!["-C", dir_arg.as_ref()];
        full.extend_from_slice(args);
        Ok(run_with_timeout(&self.executable, &full, None, self.timeout)?.stdout)
    }

    fn fresh_checkout_dir(&self, full_name: &str) -> PathBuf {
        let n = CHECKOUT_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.work_dir.join(format!(
            "dep-ledger-{}-{}-{n}",
            repository_doc_id(full_name),
            std::process::id()
        ))
    }
}

impl GitCollaborator for GitCli {
    fn clone_repo(&self, full_name: &str) -> Result<Checkout> {
        let dir = self.fresh_checkout_dir(full_name);
        let url = self.remote_url(full_name);
        let dir_arg = dir.to_string_lossy();
        // Guard first so a half-finished clone is cleaned up too
        let checkout = Checkout::temporary(full_name, &dir);
        tracing::debug!(repository = full_name, %url, "cloning");
        run_with_timeout(
            &self.executable,
            &["clone", "--quiet", &url, dir_arg.as_ref()],
            None,
            self.timeout,
        )?;
        Ok(checkout)
    }

    fn checkout(&self, checkout: &Checkout, rev: &str) -> Result<String> {
        self.git(checkout.path(), &["checkout", "--quiet", "--detach", rev])?;
        let head = self.git(checkout.path(), &["rev-parse", "HEAD"])?;
        let head = head.trim();
        if head.is_empty() {
            return Err(LedgerError::external_tool(
                "git",
                format!("rev-parse returned nothing after checking out {rev}"),
            ));
        }
        Ok(head.to_string())
    }

    fn list_refs_at_sha(&self, checkout: &Checkout, sha: &str) -> Result<Vec<String>> {
        let output = self.git(checkout.path(), &["show-ref", "-d"])?;
        Ok(parse_show_ref(&output, sha))
    }

    fn tags_at(&self, checkout: &Checkout) -> Result<BTreeMap<String, Vec<String>>> {
        // show-ref exits non-zero when there are no tags at all
        match self.git(checkout.path(), &["show-ref", "--tags", "-d"]) {
            Ok(output) => Ok(parse_tags(&output)),
            Err(LedgerError::ExternalTool { message, .. }) if message.contains("exited with") => {
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }

    fn commits(&self, checkout: &Checkout) -> Result<Vec<CommitInfo>> {
        let output = self.git(checkout.path(), &["log", "--all", "--format=%H %P"])?;
        parse_log(&output)
    }

    fn branch_heads(&self, checkout: &Checkout) -> Result<BTreeMap<String, String>> {
        let output = self.git(
            checkout.path(),
            &[
                "for-each-ref",
                "--format=%(objectname) %(refname)",
                "refs/heads",
                "refs/remotes/origin",
            ],
        )?;
        Ok(parse_branch_heads(&output))
    }

    fn default_branch(&self, checkout: &Checkout) -> Result<Option<String>> {
        match self.git(
            checkout.path(),
            &["symbolic-ref", "--quiet", "refs/remotes/origin/HEAD"],
        ) {
            Ok(output) => Ok(output
                .trim()
                .strip_prefix("refs/remotes/origin/")
                .map(str::to_string)),
            Err(_) => Ok(None),
        }
    }
}

/// `refs/remotes/origin/x` -> `refs/heads/x`; the peel suffix `^{}` is dropped
fn normalize_ref(raw: &str) -> &str {
    raw.strip_suffix("^{}").unwrap_or(raw)
}

fn show_ref_pairs(output: &str) -> BTreeMap<String, String> {
    let mut refs = BTreeMap::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(sha), Some(raw)) = (parts.next(), parts.next()) else {
            continue;
        };
        let name = normalize_ref(raw);
        if name.ends_with("/HEAD") {
            continue;
        }
        let name = name.replacen("refs/remotes/origin/", "refs/heads/", 1);
        // peeled lines follow their tag line and win
        refs.insert(name, sha.to_string());
    }
    refs
}

/// Refs from `git show-ref -d` output that point at `sha`, sorted
#[must_use]
pub fn parse_show_ref(output: &str, sha: &str) -> Vec<String> {
    show_ref_pairs(output)
        .into_iter()
        .filter(|(_, target)| target == sha)
        .map(|(name, _)| name)
        .collect()
}

/// Sha -> tag names from `git show-ref --tags -d` output
#[must_use]
pub fn parse_tags(output: &str) -> BTreeMap<String, Vec<String>> {
    let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, sha) in show_ref_pairs(output) {
        if let Some(tag) = crate::ledger::tag_name(&name) {
            tags.entry(sha).or_default().push(tag.to_string());
        }
    }
    tags
}

/// Commits from `git log --format='%H %P'` output
pub fn parse_log(output: &str) -> Result<Vec<CommitInfo>> {
    let mut commits = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(sha) = fields.next() else {
            continue;
        };
        if !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::external_tool(
                "git",
                format!("unexpected log line {}: {line}", idx + 1),
            ));
        }
        commits.push(CommitInfo::new(sha, fields.map(str::to_string).collect()));
    }
    Ok(commits)
}

/// Branch name -> head sha from `git for-each-ref --format='%(objectname) %(refname)'`.
///
/// Local branches win over their `origin` counterparts.
#[must_use]
pub fn parse_branch_heads(output: &str) -> BTreeMap<String, String> {
    let mut remote: BTreeMap<String, String> = BTreeMap::new();
    let mut local: BTreeMap<String, String> = BTreeMap::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(sha), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if let Some(branch) = name.strip_prefix("refs/heads/") {
            local.insert(branch.to_string(), sha.to_string());
        } else if let Some(branch) = name.strip_prefix("refs/remotes/origin/") {
            if branch != "HEAD" {
                remote.insert(branch.to_string(), sha.to_string());
            }
        }
    }
    remote.extend(local);
    remote
}
