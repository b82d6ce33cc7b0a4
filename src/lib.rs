//! **A historical ledger of the dependencies declared by git repositories.**
//!
//! `dep-ledger` scans the package manifests of a repository at a given commit, normalizes
//! what they declare into a single dependency model, and records the result in a document
//! store. Each ref of a repository keeps a hash-chained history of the commits that were
//! scanned on it, so the dependencies of any recorded commit, ref tip or tag can be
//! retrieved later, and two points in history can be compared.
//!
//! ## Core Concepts & Modules
//!
//! - **[`parsers`]**: one [`ManifestParser`](parsers::ManifestParser) per manifest kind
//!   (pip requirements, conda environments, conda recipes, npm, glide and Maven) behind a
//!   [`ParserRegistry`](parsers::ParserRegistry) that walks a checkout.
//! - **[`model`]**: [`Dependency`], its content hash, and the [`Scan`] of one commit.
//! - **[`store`]**: the [`DocumentStore`](store::DocumentStore) seam plus in-memory and
//!   file-backed implementations.
//! - **[`ledger`]**: per-repository ref chains, deduplicated scan recording and retrieval.
//! - **[`diff`]**: dependency differences between two recorded commits.
//! - **[`history`]**: the commit history tree of a repository and its graph layout.
//! - **[`pipeline`]**: the staged, multi-threaded ingestion pipeline fed by push events.
//!
//! ## Getting Started: Scanning a Checkout
//!
//! ```no_run
//! use std::path::Path;
//! use dep_ledger::parsers::ParserRegistry;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ParserRegistry::declared_only();
//!     let scan = registry.scan_directory(Path::new("path/to/checkout"), false)?;
//!
//!     for dep in &scan.dependencies {
//!         println!("{dep}");
//!     }
//!     for issue in &scan.issues {
//!         eprintln!("weak version pin: {}", issue.dependency_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Recording and Reading Back
//!
//! ```no_run
//! use std::sync::Arc;
//! use dep_ledger::ledger::{Ledger, Retriever};
//! use dep_ledger::store::MemoryStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn dep_ledger::store::DocumentStore> = Arc::new(MemoryStore::new());
//!     let ledger = Ledger::new(Arc::clone(&store));
//!     # let scan: dep_ledger::model::Scan = unimplemented!();
//!     # let hashes = Vec::new();
//!     ledger.record_scan(&scan, "refs/heads/main", &hashes)?;
//!
//!     let report = Retriever::new(store).dependencies_by_ref("acme/api", "main")?;
//!     println!("{} dependencies at {}", report.dependencies.len(), report.sha);
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    // Variable names like `old`/`new` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod history;
pub mod ledger;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use diff::{DependencyDiff, DiffEngine};
pub use error::{ErrorContext, LedgerError, OptionContext, Result};
pub use history::{HistoryTree, Layout};
pub use ledger::{Ledger, Retriever};
pub use model::{Dependency, DependencyHash, Ecosystem, Scan};
pub use parsers::{ManifestKind, ParserRegistry};
pub use pipeline::{IngestTask, Pipeline};
