//! Default values for dep-ledger configuration.

use super::types::{GitConfig, HistoryConfig, MavenConfig, PipelineConfig, StoreConfig};
use crate::parsers::MavenMode;
use std::path::PathBuf;

// ============================================================================
// Default Constants
// ============================================================================

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_COMMIT_WORKERS: usize = 2;
/// Capacity of each inter-stage queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAVEN_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_SUBTREE_DEPTH: usize = 10;

/// `<data dir>/dep-ledger`, or `.dep-ledger` in the working directory
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("dep-ledger"))
        .unwrap_or_else(|| PathBuf::from(".dep-ledger"))
}

// ============================================================================
// Default Implementations
// ============================================================================

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            commit_workers: DEFAULT_COMMIT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            include_test_deps: false,
            record_diffs: true,
            track_history: true,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            work_dir: None,
            executable: "git".to_string(),
            timeout_secs: DEFAULT_GIT_TIMEOUT_SECS,
        }
    }
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            mode: MavenMode::Resolve,
            executable: "mvn".to_string(),
            timeout_secs: DEFAULT_MAVEN_TIMEOUT_SECS,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            subtree_depth: DEFAULT_SUBTREE_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Validatable};

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.is_valid(), "{:?}", config.validate());
        assert_eq!(config.pipeline.queue_capacity, 1000);
        assert_eq!(config.maven.mode, MavenMode::Resolve);
        assert!(config.store.path.ends_with("dep-ledger") || config.store.path.ends_with(".dep-ledger"));
    }
}
