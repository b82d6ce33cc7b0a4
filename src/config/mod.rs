//! Configuration for dep-ledger.
//!
//! Configuration is a YAML file with one section per concern, discovered in the working
//! directory, the enclosing git repository, the user config directory or the home
//! directory. Command-line flags override file values.
//!
//! ```yaml
//! pipeline:
//!   workers: 8
//!   include_test_deps: false
//! git:
//!   remote_base: https://github.com
//! maven:
//!   mode: declared
//! store:
//!   path: /var/lib/dep-ledger
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    default_store_path, DEFAULT_COMMIT_WORKERS, DEFAULT_QUEUE_CAPACITY, DEFAULT_SUBTREE_DEPTH,
    DEFAULT_WORKERS,
};
pub use types::{
    AppConfig, AppConfigBuilder, GitConfig, HistoryConfig, MavenConfig, PipelineConfig,
    StoreConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError, ConfigOverrides,
};

/// JSON Schema of the configuration file format.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_sections() {
        let schema = generate_json_schema();
        for section in ["pipeline", "git", "maven", "store", "history"] {
            assert!(schema.contains(section), "missing {section}");
        }
    }
}
