//! Ingest command handler.
//!
//! Feeds tasks through the pipeline into the configured store. Ctrl-C stops intake;
//! tasks already queued still finish.

use super::{build_parsers, open_store};
use crate::config::AppConfig;
use crate::git::GitCli;
use crate::pipeline::{
    exit_codes, read_tasks, write_json, IngestTask, OutputTarget, Pipeline, PipelineDeps,
    StatsSnapshot,
};
use anyhow::{Context, Result};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub tasks: Vec<IngestTask>,
    /// JSON-lines task file, `-` for stdin
    pub task_file: Option<PathBuf>,
    pub output: OutputTarget,
}

pub fn run_ingest(config: &AppConfig, request: IngestRequest) -> Result<i32> {
    let mut tasks = request.tasks;
    if let Some(path) = &request.task_file {
        tasks.extend(load_task_file(path)?);
    }
    if tasks.is_empty() {
        anyhow::bail!("No tasks given; pass --repo/--sha/--ref or --tasks <file>");
    }

    let stats = run_tasks(config, tasks)?;
    write_json(&stats, &request.output)?;
    Ok(if stats.failed > 0 {
        exit_codes::ERROR
    } else {
        exit_codes::SUCCESS
    })
}

fn load_task_file(path: &PathBuf) -> Result<Vec<IngestTask>> {
    if path.as_os_str() == "-" {
        let stdin = std::io::stdin();
        return Ok(read_tasks(stdin.lock(), "<stdin>")?);
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open task file {}", path.display()))?;
    Ok(read_tasks(BufReader::new(file), &path.to_string_lossy())?)
}

/// Run `tasks` through a pipeline built from `config` and wait for it to drain
pub(crate) fn run_tasks(config: &AppConfig, tasks: Vec<IngestTask>) -> Result<StatsSnapshot> {
    let deps = PipelineDeps {
        store: open_store(config)?,
        git: Arc::new(GitCli::new(&config.git)),
        parsers: Arc::new(build_parsers(config)),
    };
    let pipeline = Pipeline::start(&config.pipeline, deps)?;

    // Graceful shutdown flag
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop_flag.store(true, Ordering::Relaxed);
        })
        .ok(); // Non-fatal if handler cannot be installed
    }

    let total = tasks.len();
    for task in tasks {
        if stop.load(Ordering::Relaxed) {
            tracing::warn!(
                submitted = pipeline.stats().submitted,
                total,
                "interrupted; finishing queued tasks"
            );
            break;
        }
        pipeline.submit(task)?;
    }

    Ok(pipeline.finish()?)
}
