//! CLI command handlers.
//!
//! Each handler takes the resolved [`AppConfig`] plus a small request struct built by
//! `main.rs`, and returns the process exit code. Ledger errors are passed up unchanged
//! so the caller can map "not found" to its own exit code.

mod backfill;
mod diff;
mod history;
mod ingest;
mod list;
mod report;
mod scan;
mod search;

pub use backfill::{run_backfill, BackfillRequest};
pub use diff::{run_diff, DiffRequest};
pub use history::{run_history, HistoryRequest};
pub use ingest::{run_ingest, IngestRequest};
pub use list::{run_list, ListRequest};
pub use report::{run_report, ReportRequest, Selector};
pub use scan::{run_scan, ScanRequest};
pub use search::{run_search, SearchRequest};

use crate::config::AppConfig;
use crate::error::LedgerError;
use crate::parsers::{MavenCli, MavenMode, MavenParser, ParserRegistry};
use crate::pipeline::exit_codes;
use crate::store::{DocumentStore, FileStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Open the configured file store, creating its directory if needed
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    let store = FileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store at {}", config.store.path.display()))?;
    Ok(Arc::new(store))
}

/// Parser registry honoring the configured Maven mode
#[must_use]
pub fn build_parsers(config: &AppConfig) -> ParserRegistry {
    match config.maven.mode {
        MavenMode::Declared => ParserRegistry::declared_only(),
        MavenMode::Resolve => {
            let tool = MavenCli::new(
                config.maven.executable.clone(),
                Duration::from_secs(config.maven.timeout_secs),
            );
            ParserRegistry::with_maven(MavenParser::resolving(Arc::new(tool)))
        }
    }
}

/// Exit code for a failed command
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LedgerError>() {
        Some(e) if e.is_not_found() => exit_codes::NOT_FOUND,
        _ => exit_codes::ERROR,
    }
}
