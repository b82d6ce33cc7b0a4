//! Search command handler: which recorded commits use a dependency.

use super::open_store;
use crate::config::AppConfig;
use crate::ledger::{DependencySearch, Retriever};
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub name: String,
    /// Version prefix; `None` matches every version
    pub version: Option<String>,
    /// Restrict to these repositories
    pub repositories: Vec<String>,
    /// Restrict to repositories of this organization
    pub org: Option<String>,
    pub output: OutputTarget,
}

pub fn run_search(config: &AppConfig, request: SearchRequest) -> Result<i32> {
    let retriever = Retriever::new(open_store(config)?);
    let mut repos = request.repositories;
    if let Some(org) = request.org.as_deref() {
        let in_org = retriever.list_repositories(Some(org))?;
        if in_org.is_empty() && repos.is_empty() {
            tracing::warn!(org, "no tracked repositories in organization");
            let empty = DependencySearch {
                dependencies: Vec::new(),
                occurrences: Vec::new(),
            };
            write_json(&empty, &request.output)?;
            return Ok(exit_codes::SUCCESS);
        }
        repos.extend(in_org);
    }
    let filter = (!repos.is_empty()).then_some(repos.as_slice());
    let found = retriever.search_dependency(&request.name, request.version.as_deref(), filter)?;
    tracing::info!(
        name = %request.name,
        dependencies = found.dependencies.len(),
        occurrences = found.occurrences.len(),
        "dependency search"
    );
    write_json(&found, &request.output)?;
    Ok(exit_codes::SUCCESS)
}
