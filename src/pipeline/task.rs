//! Ingestion task wire format.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One unit of ingestion work: scan `after_sha` of a repository as seen on `ref_name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngestTask {
    #[serde(rename = "repositoryFullName")]
    pub repository_full_name: String,
    #[serde(rename = "afterSha")]
    pub after_sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

impl IngestTask {
    pub fn new(
        repository_full_name: impl Into<String>,
        after_sha: impl Into<String>,
        ref_name: impl Into<String>,
    ) -> Self {
        Self {
            repository_full_name: repository_full_name.into(),
            after_sha: after_sha.into(),
            ref_name: ref_name.into(),
        }
    }

    /// Reject tasks that cannot be processed at all
    pub fn validate(&self) -> Result<()> {
        if self.repository_full_name.trim().is_empty() {
            return Err(LedgerError::validation("task has no repository name"));
        }
        if self.after_sha.trim().is_empty() {
            return Err(LedgerError::validation(format!(
                "task for {} has no sha",
                self.repository_full_name
            )));
        }
        if self.ref_name.trim().is_empty() {
            return Err(LedgerError::validation(format!(
                "task for {}@{} has no ref",
                self.repository_full_name, self.after_sha
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for IngestTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.repository_full_name,
            crate::utils::short_sha(&self.after_sha),
            self.ref_name
        )
    }
}

/// Read JSON-lines tasks; blank lines and `#` comments are skipped
pub fn read_tasks<R: BufRead>(reader: R, source: &str) -> Result<Vec<IngestTask>> {
    let mut tasks = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LedgerError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let task: IngestTask = serde_json::from_str(trimmed).map_err(|e| {
            LedgerError::parse(
                source,
                crate::error::ParseErrorKind::InvalidLine {
                    line: idx + 1,
                    content: e.to_string(),
                },
            )
        })?;
        tasks.push(task);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let task = IngestTask::new("acme/api", "abc123", "refs/heads/main");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["repositoryFullName"], "acme/api");
        assert_eq!(json["afterSha"], "abc123");
        assert_eq!(json["ref"], "refs/heads/main");
    }

    #[test]
    fn test_validate() {
        assert!(IngestTask::new("acme/api", "abc", "refs/heads/main").validate().is_ok());
        assert!(IngestTask::new("", "abc", "refs/heads/main").validate().is_err());
        assert!(IngestTask::new("acme/api", " ", "refs/heads/main").validate().is_err());
        assert!(IngestTask::new("acme/api", "abc", "").validate().is_err());
    }

    #[test]
    fn test_read_tasks() {
        let input = "\
# nightly
{\"repositoryFullName\":\"acme/api\",\"afterSha\":\"a1\",\"ref\":\"refs/heads/main\"}

{\"repositoryFullName\":\"acme/web\",\"afterSha\":\"b2\",\"ref\":\"refs/tags/v1\"}
";
        let tasks = read_tasks(input.as_bytes(), "tasks.jsonl").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].ref_name, "refs/tags/v1");
    }

    #[test]
    fn test_read_tasks_reports_line() {
        let input = "{\"repositoryFullName\":\"acme/api\",\"afterSha\":\"a1\",\"ref\":\"x\"}\nnot json\n";
        let err = read_tasks(input.as_bytes(), "tasks.jsonl").unwrap_err();
        assert!(err.to_string().contains("tasks.jsonl"));
    }
}
