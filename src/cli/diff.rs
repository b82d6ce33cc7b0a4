//! Diff command handler.
//!
//! Compares two recorded commits, or the tips of two refs, of one repository.

use super::open_store;
use crate::config::AppConfig;
use crate::diff::{DependencyDiff, DiffEngine};
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub repository: String,
    pub old: String,
    pub new: String,
    /// Treat `old` and `new` as ref names instead of shas
    pub refs: bool,
    /// Persist the result as a difference document
    pub record: bool,
    pub fail_on_change: bool,
    pub output: OutputTarget,
}

pub fn run_diff(config: &AppConfig, request: DiffRequest) -> Result<i32> {
    let engine = DiffEngine::new(open_store(config)?);
    let diff = if request.refs {
        engine.diff_refs(&request.repository, &request.old, &request.new)?
    } else {
        engine.diff_shas(&request.repository, &request.old, &request.new)?
    };

    if request.record && engine.record(&diff)? {
        tracing::info!(id = %diff.doc_id(), "difference recorded");
    }
    tracing::info!("{}", diff.summary());

    write_json(&diff, &request.output)?;
    Ok(determine_exit_code(&request, &diff))
}

fn determine_exit_code(request: &DiffRequest, diff: &DependencyDiff) -> i32 {
    if request.fail_on_change && (!diff.added.is_empty() || !diff.removed.is_empty()) {
        return exit_codes::CHANGES_DETECTED;
    }
    exit_codes::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependency, Ecosystem};
    use chrono::Utc;

    fn request(fail_on_change: bool) -> DiffRequest {
        DiffRequest {
            repository: "acme/api".into(),
            old: "a".into(),
            new: "b".into(),
            refs: false,
            record: false,
            fail_on_change,
            output: OutputTarget::Stdout,
        }
    }

    fn diff(added: Vec<Dependency>) -> DependencyDiff {
        DependencyDiff {
            repository: "acme/api".into(),
            ref_name: None,
            old_sha: "a".into(),
            new_sha: "b".into(),
            added,
            removed: vec![],
            unresolved: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_exit_code() {
        let changed = diff(vec![Dependency::new("flask", "2.0", Ecosystem::Python)]);
        assert_eq!(determine_exit_code(&request(true), &changed), exit_codes::CHANGES_DETECTED);
        assert_eq!(determine_exit_code(&request(false), &changed), exit_codes::SUCCESS);
        assert_eq!(determine_exit_code(&request(true), &diff(vec![])), exit_codes::SUCCESS);
    }
}
