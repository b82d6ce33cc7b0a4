//! Dependency differences between recorded snapshots.
//!
//! The pure part, [`diff_hashes`], is set arithmetic on sorted hash lists. The
//! [`DiffEngine`] wraps it with ledger lookups: it resolves each side's hash list
//! through the entry chain, turns changed hashes back into dependencies, and can persist
//! the result as a difference document.
//!
//! ```no_run
//! use dep_ledger::diff::DiffEngine;
//! use dep_ledger::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let engine = DiffEngine::new(Arc::new(MemoryStore::new()));
//! let diff = engine.diff_refs("acme/api", "refs/tags/v1.0", "refs/heads/main").unwrap();
//! println!("{}", diff.summary());
//! ```

mod engine;
mod result;

pub use engine::DiffEngine;
pub use result::{diff_hashes, DependencyDiff, HashDiff};
