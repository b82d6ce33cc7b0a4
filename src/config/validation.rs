//! Configuration validation for dep-ledger.

use super::types::*;

// ============================================================================
// Configuration Error
// ============================================================================

/// A single invalid configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted path of the field, e.g. `pipeline.workers`
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn at_least_one(errors: &mut Vec<ConfigError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ConfigError::new(field, "must be at least 1"));
    }
}

fn not_blank(errors: &mut Vec<ConfigError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigError::new(field, "must not be empty"));
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.pipeline.validate());
        errors.extend(self.git.validate());
        errors.extend(self.maven.validate());
        errors.extend(self.store.validate());
        errors.extend(self.history.validate());
        errors
    }
}

impl Validatable for PipelineConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        at_least_one(&mut errors, "pipeline.workers", self.workers as u64);
        at_least_one(&mut errors, "pipeline.commit_workers", self.commit_workers as u64);
        at_least_one(&mut errors, "pipeline.queue_capacity", self.queue_capacity as u64);
        errors
    }
}

impl Validatable for GitConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        not_blank(&mut errors, "git.remote_base", &self.remote_base);
        not_blank(&mut errors, "git.executable", &self.executable);
        at_least_one(&mut errors, "git.timeout_secs", self.timeout_secs);
        if let Some(dir) = &self.work_dir {
            if !dir.is_dir() {
                errors.push(ConfigError::new(
                    "git.work_dir",
                    format!("not a directory: {}", dir.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for MavenConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        not_blank(&mut errors, "maven.executable", &self.executable);
        at_least_one(&mut errors, "maven.timeout_secs", self.timeout_secs);
        errors
    }
}

impl Validatable for StoreConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.path.as_os_str().is_empty() {
            errors.push(ConfigError::new("store.path", "must not be empty"));
        } else if self.path.exists() && !self.path.is_dir() {
            errors.push(ConfigError::new(
                "store.path",
                format!("exists but is not a directory: {}", self.path.display()),
            ));
        }
        errors
    }
}

impl Validatable for HistoryConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        at_least_one(&mut errors, "history.subtree_depth", self.subtree_depth as u64);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        let config = AppConfig::builder().workers(0).queue_capacity(0).build();
        let errors = config.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["pipeline.workers", "pipeline.queue_capacity"]);
    }

    #[test]
    fn test_blank_executable_rejected() {
        let mut config = AppConfig::default();
        config.git.executable = "  ".into();
        config.maven.timeout_secs = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "git.executable: must not be empty");
    }

    #[test]
    fn test_store_path_must_be_directory() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = StoreConfig {
            path: tmp.path().to_path_buf(),
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_missing_work_dir_rejected() {
        let mut config = GitConfig::default();
        config.work_dir = Some("/definitely/not/here".into());
        assert_eq!(config.validate()[0].field, "git.work_dir");
    }
}
