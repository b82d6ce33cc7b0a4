//! Scan command handler.
//!
//! Scans a local directory without touching git or the store.

use super::build_parsers;
use crate::config::AppConfig;
use crate::pipeline::{exit_codes, scan_checkout, write_json, OutputTarget};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub dir: PathBuf,
    /// Repository name recorded in the output; defaults to the directory name
    pub repository: Option<String>,
    pub sha: Option<String>,
    pub output: OutputTarget,
}

pub fn run_scan(config: &AppConfig, request: ScanRequest) -> Result<i32> {
    let dir = request
        .dir
        .canonicalize()
        .with_context(|| format!("Cannot scan {}", request.dir.display()))?;
    let repository = request.repository.unwrap_or_else(|| {
        dir.file_name()
            .map_or_else(|| "local".to_string(), |n| n.to_string_lossy().into_owned())
    });
    let sha = request.sha.unwrap_or_else(|| "working-tree".to_string());

    let parsers = build_parsers(config);
    let (scan, hashes) = scan_checkout(
        &parsers,
        &dir,
        &repository,
        &sha,
        Vec::new(),
        config.pipeline.include_test_deps,
    )?;

    tracing::info!(
        files = scan.files_scanned.len(),
        dependencies = scan.dependencies.len(),
        unique_hashes = hashes.len(),
        issues = scan.issues.len(),
        "scan complete"
    );
    write_json(&scan, &request.output)?;
    Ok(exit_codes::SUCCESS)
}
