//! Report command handler.

use super::open_store;
use crate::config::AppConfig;
use crate::ledger::Retriever;
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

/// Which recorded commit to report on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Sha(String),
    /// Newest recorded sha of a ref; bare names are tried as `refs/heads/<name>` too
    Ref(String),
    Tag(String),
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub repository: String,
    pub selector: Selector,
    pub output: OutputTarget,
}

pub fn run_report(config: &AppConfig, request: ReportRequest) -> Result<i32> {
    let retriever = Retriever::new(open_store(config)?);
    let report = match &request.selector {
        Selector::Sha(sha) => retriever.dependencies_by_sha(&request.repository, sha)?,
        Selector::Ref(name) => retriever.dependencies_by_ref(&request.repository, name)?,
        Selector::Tag(tag) => retriever.dependencies_by_tag(&request.repository, tag)?,
    };
    if !report.unresolved.is_empty() {
        tracing::warn!(
            count = report.unresolved.len(),
            "some dependency documents are not visible yet"
        );
    }
    write_json(&report, &request.output)?;
    Ok(exit_codes::SUCCESS)
}
