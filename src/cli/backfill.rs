//! Backfill command handler.
//!
//! Plans scans for tagged commits of a repository that were never ingested, and
//! optionally runs them.

use super::ingest::run_tasks;
use super::open_store;
use crate::config::AppConfig;
use crate::error::{LedgerError, NotFoundKind};
use crate::history::{load_history, plan_backfill};
use crate::ledger::Ledger;
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct BackfillRequest {
    pub repository: String,
    /// Run the planned tasks instead of only printing them
    pub run: bool,
    pub output: OutputTarget,
}

pub fn run_backfill(config: &AppConfig, request: BackfillRequest) -> Result<i32> {
    let store = open_store(config)?;
    let doc = load_history(store.as_ref(), &request.repository)?.ok_or_else(|| {
        LedgerError::not_found(NotFoundKind::Document, format!("history of {}", request.repository))
    })?;
    let record = Ledger::new(store).load_repository(&request.repository)?;

    let tasks = plan_backfill(&request.repository, &doc.tree, record.as_ref());
    tracing::info!(repository = %request.repository, planned = tasks.len(), "backfill planned");

    if !request.run || tasks.is_empty() {
        write_json(&tasks, &request.output)?;
        return Ok(exit_codes::SUCCESS);
    }

    let stats = run_tasks(config, tasks)?;
    write_json(&stats, &request.output)?;
    Ok(if stats.failed > 0 {
        exit_codes::ERROR
    } else {
        exit_codes::SUCCESS
    })
}
