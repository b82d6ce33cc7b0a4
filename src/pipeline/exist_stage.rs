//! Stage 1: drop tasks whose (repository, sha) already has a scan.

use super::task::IngestTask;
use crate::error::Result;
use crate::ledger::Ledger;

/// What stage 1 decided for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Forward,
    AlreadyScanned,
}

pub(crate) fn admit(ledger: &Ledger, task: &IngestTask) -> Result<Admission> {
    task.validate()?;
    if ledger.scan_exists(&task.repository_full_name, &task.after_sha)? {
        return Ok(Admission::AlreadyScanned);
    }
    Ok(Admission::Forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scan;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_admission() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let task = IngestTask::new("acme/api", "a1", "refs/heads/main");
        assert_eq!(admit(&ledger, &task).unwrap(), Admission::Forward);

        let scan = Scan {
            repo_full_name: "acme/api".into(),
            sha: "a1".into(),
            refs: vec![],
            dependencies: vec![],
            issues: vec![],
            files_scanned: vec![],
            timestamp: Utc::now(),
        };
        ledger.record_scan(&scan, "refs/heads/main", &[]).unwrap();
        assert_eq!(admit(&ledger, &task).unwrap(), Admission::AlreadyScanned);

        // same sha under another ref is still a duplicate
        let other = IngestTask::new("acme/api", "a1", "refs/tags/v1");
        assert_eq!(admit(&ledger, &other).unwrap(), Admission::AlreadyScanned);
    }

    #[test]
    fn test_invalid_task_rejected() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        assert!(admit(&ledger, &IngestTask::new("acme/api", "", "refs/heads/main")).is_err());
    }
}
