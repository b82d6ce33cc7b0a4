//! Configuration file loading and discovery.

use super::types::AppConfig;
use crate::parsers::MavenMode;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

const CONFIG_FILE_NAMES: &[&str] = &[".dep-ledger.yaml", ".dep-ledger.yml"];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/dep-ledger/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    let candidates = [
        cwd.clone(),
        cwd.as_deref().and_then(find_git_root),
        dirs::config_dir().map(|dir| dir.join("dep-ledger")),
        dirs::home_dir(),
    ];
    candidates
        .iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(dir))
}

fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Nearest ancestor of `start` containing `.git`
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    NotFound(PathBuf),
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from the discovered file, or fall back to defaults.
///
/// An explicit path that fails to load is an error; a discovered file that fails to
/// load is logged and skipped.
pub fn load_or_default(
    explicit_path: Option<&Path>,
) -> Result<(AppConfig, Option<PathBuf>), ConfigFileError> {
    if let Some(path) = explicit_path {
        return load_config_file(path).map(|config| (config, Some(path.to_path_buf())));
    }
    Ok(discover_config_file(None).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    ))
}

// ============================================================================
// Configuration Merging
// ============================================================================

/// Values given on the command line; each one set replaces the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub workers: Option<usize>,
    pub commit_workers: Option<usize>,
    pub include_test_deps: Option<bool>,
    pub record_diffs: Option<bool>,
    pub track_history: Option<bool>,
    pub remote_base: Option<String>,
    pub maven_mode: Option<MavenMode>,
    pub subtree_depth: Option<usize>,
}

impl AppConfig {
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.store_path {
            self.store.path.clone_from(path);
        }
        if let Some(workers) = overrides.workers {
            self.pipeline.workers = workers;
        }
        if let Some(workers) = overrides.commit_workers {
            self.pipeline.commit_workers = workers;
        }
        if let Some(include) = overrides.include_test_deps {
            self.pipeline.include_test_deps = include;
        }
        if let Some(record) = overrides.record_diffs {
            self.pipeline.record_diffs = record;
        }
        if let Some(track) = overrides.track_history {
            self.pipeline.track_history = track;
        }
        if let Some(base) = &overrides.remote_base {
            self.git.remote_base.clone_from(base);
        }
        if let Some(mode) = overrides.maven_mode {
            self.maven.mode = mode;
        }
        if let Some(depth) = overrides.subtree_depth {
            self.history.subtree_depth = depth;
        }
    }

    /// Load from file and apply CLI overrides.
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<(Self, Option<PathBuf>), ConfigFileError> {
        let (mut config, loaded_from) = load_or_default(config_path)?;
        config.apply(overrides);
        Ok((config, loaded_from))
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# dep-ledger configuration
# Place this file at .dep-ledger.yaml in your project root or ~/.config/dep-ledger/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

// ============================================================================
// Tests
// ============================================================================
