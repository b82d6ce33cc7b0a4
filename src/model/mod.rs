//! Canonical representation of scanned dependencies.
//!
//! Every manifest parser normalizes into [`Dependency`]; everything downstream (dedup,
//! hashing, the ledger, diffing) works on these types or on their [`DependencyHash`].

mod dependency;
mod issue;
mod scan;

pub use dependency::*;
pub use issue::*;
pub use scan::*;
