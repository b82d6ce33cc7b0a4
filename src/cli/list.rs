//! List command handler.
//!
//! Without a repository lists tracked repositories; with one lists its refs; with a
//! repository and a ref lists the recorded shas, newest first.

use super::open_store;
use crate::config::AppConfig;
use crate::ledger::Retriever;
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct ListRequest {
    pub repository: Option<String>,
    pub ref_name: Option<String>,
    /// Restrict repository listing to one organization
    pub org: Option<String>,
    pub output: OutputTarget,
}

pub fn run_list(config: &AppConfig, request: ListRequest) -> Result<i32> {
    let retriever = Retriever::new(open_store(config)?);
    let items = match (&request.repository, &request.ref_name) {
        (None, _) => retriever.list_repositories(request.org.as_deref())?,
        (Some(repo), None) => retriever.list_refs(repo)?,
        (Some(repo), Some(ref_name)) => retriever.list_shas(repo, ref_name)?,
    };
    write_json(&items, &request.output)?;
    Ok(exit_codes::SUCCESS)
}
