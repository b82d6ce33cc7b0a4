//! Configuration types for dep-ledger.

use crate::parsers::MavenMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Top-level configuration, loaded from a config file and then overridden by CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Ingestion pipeline sizing and behavior
    pub pipeline: PipelineConfig,
    /// How repositories are cloned
    pub git: GitConfig,
    /// How Maven projects are resolved
    pub maven: MavenConfig,
    /// Where documents are stored
    pub store: StoreConfig,
    /// History graph settings
    pub history: HistoryConfig,
}

impl AppConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub const fn workers(mut self, workers: usize) -> Self {
        self.config.pipeline.workers = workers;
        self
    }

    pub const fn commit_workers(mut self, workers: usize) -> Self {
        self.config.pipeline.commit_workers = workers;
        self
    }

    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.pipeline.queue_capacity = capacity;
        self
    }

    pub const fn include_test_deps(mut self, include: bool) -> Self {
        self.config.pipeline.include_test_deps = include;
        self
    }

    pub const fn record_diffs(mut self, record: bool) -> Self {
        self.config.pipeline.record_diffs = record;
        self
    }

    pub const fn track_history(mut self, track: bool) -> Self {
        self.config.pipeline.track_history = track;
        self
    }

    pub fn remote_base(mut self, base: impl Into<String>) -> Self {
        self.config.git.remote_base = base.into();
        self
    }

    pub const fn maven_mode(mut self, mode: MavenMode) -> Self {
        self.config.maven.mode = mode;
        self
    }

    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store.path = path.into();
        self
    }

    pub const fn subtree_depth(mut self, depth: usize) -> Self {
        self.config.history.subtree_depth = depth;
        self
    }

    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Ingestion pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    /// Checkout-and-parse workers
    #[schemars(range(min = 1))]
    pub workers: usize,
    /// Workers committing scans into entry chains
    #[schemars(range(min = 1))]
    pub commit_workers: usize,
    /// Capacity of each inter-stage queue
    #[schemars(range(min = 1))]
    pub queue_capacity: usize,
    /// Include test/dev dependencies
    pub include_test_deps: bool,
    /// Persist a difference document against the previous tip after each commit
    pub record_diffs: bool,
    /// Update the repository's history tree during ingestion
    pub track_history: bool,
}

/// Git collaborator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GitConfig {
    /// Base URL or directory that `<org>/<name>` is appended to when cloning
    pub remote_base: String,
    /// Parent directory for temporary checkouts (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// `git` executable
    pub executable: String,
    /// Timeout for each git invocation, in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
}

/// Maven resolution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MavenConfig {
    /// `resolve` runs the build tool; `declared` reads pom.xml only
    pub mode: MavenMode,
    /// `mvn` executable
    pub executable: String,
    /// Timeout for one resolution, in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
}

/// Document store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one JSON file per document type
    pub path: PathBuf,
}

/// History graph configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HistoryConfig {
    /// Generations below the leaves included in a layout
    #[schemars(range(min = 1))]
    pub subtree_depth: usize,
}
