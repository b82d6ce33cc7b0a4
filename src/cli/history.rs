//! History command handler.
//!
//! Prints the visualization graph of a stored history tree.

use super::open_store;
use crate::config::AppConfig;
use crate::error::{LedgerError, NotFoundKind};
use crate::history::{layout, load_history, RecordedScans};
use crate::ledger::Ledger;
use crate::pipeline::{exit_codes, write_json, OutputTarget};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub repository: String,
    /// Overrides `history.subtree_depth`
    pub depth: Option<usize>,
    pub output: OutputTarget,
}

pub fn run_history(config: &AppConfig, request: HistoryRequest) -> Result<i32> {
    let store = open_store(config)?;
    let doc = load_history(store.as_ref(), &request.repository)?.ok_or_else(|| {
        LedgerError::not_found(NotFoundKind::Document, format!("history of {}", request.repository))
    })?;

    let ledger = Ledger::new(store);
    let presence = RecordedScans::new(&ledger, &request.repository);
    let depth = request.depth.unwrap_or(config.history.subtree_depth);
    let graph = layout(&doc.tree, depth, &presence);

    write_json(&graph, &request.output)?;
    Ok(exit_codes::SUCCESS)
}
