//! Canonical dependency type, identity and content hashing.
//!
//! Every manifest format is normalized into [`Dependency`]. Two dependencies are the same
//! when their [`DependencyIdentity`] matches: the name compared case-insensitively, the
//! version (empty when unconstrained) and the ecosystem. The identity is what gets hashed,
//! so the hash is stable across processes and across manifest spellings like `Flask` and
//! `flask`.

use crate::utils::content_hash_hex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Packaging ecosystem a dependency belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Maven,
    Npm,
    Go,
    Python,
}

impl Ecosystem {
    /// Stable lowercase name used in persisted documents
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Maven => "maven",
            Self::Npm => "npm",
            Self::Go => "go",
            Self::Python => "python",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maven" | "java" => Ok(Self::Maven),
            "npm" | "javascript" | "js" => Ok(Self::Npm),
            "go" | "golang" => Ok(Self::Go),
            "python" | "pypi" | "conda" => Ok(Self::Python),
            other => Err(format!("unknown ecosystem '{other}'")),
        }
    }
}

/// Content hash of a [`DependencyIdentity`], rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyHash(String);

impl DependencyHash {
    /// Wrap an already-computed hash string (e.g. read back from the store)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized identity of a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyIdentity {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
}

impl DependencyIdentity {
    /// Deterministic content hash of this identity.
    ///
    /// Fields are joined with NUL so `("a:b", "c")` and `("a", "b:c")` never collide.
    #[must_use]
    pub fn hash(&self) -> DependencyHash {
        let mut bytes =
            Vec::with_capacity(self.name.len() + self.version.len() + 10);
        bytes.extend_from_slice(self.name.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.version.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.ecosystem.as_str().as_bytes());
        DependencyHash(content_hash_hex(&bytes))
    }
}

/// A declared third-party dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Declared version; empty when the manifest leaves it unconstrained
    #[serde(default)]
    pub version: String,
    pub ecosystem: Ecosystem,
}

impl Dependency {
    /// Create a new dependency, trimming surrounding whitespace from name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        let name: String = name.into();
        let version: String = version.into();
        Self {
            name: name.trim().to_string(),
            version: version.trim().to_string(),
            ecosystem,
        }
    }

    #[must_use]
    pub fn identity(&self) -> DependencyIdentity {
        DependencyIdentity {
            name: self.name.to_lowercase(),
            version: self.version.clone(),
            ecosystem: self.ecosystem,
        }
    }

    #[must_use]
    pub fn hash(&self) -> DependencyHash {
        self.identity().hash()
    }

    /// Canonical ordering: name, then version, then ecosystem, all ascending
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str, Ecosystem) {
        (&self.name, &self.version, self.ecosystem)
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{} ({})", self.name, self.ecosystem)
        } else {
            write!(f, "{}@{} ({})", self.name, self.version, self.ecosystem)
        }
    }
}

/// Remove later occurrences of a dependency whose identity was already seen.
///
/// The first occurrence wins and relative order is preserved.
pub fn remove_exact_duplicates(deps: &mut Vec<Dependency>) {
    let mut seen: HashSet<DependencyIdentity> = HashSet::with_capacity(deps.len());
    deps.retain(|dep| seen.insert(dep.identity()));
}

/// Sort dependencies by the canonical key.
pub fn sort_dependencies(deps: &mut [Dependency]) {
    deps.sort();
}

/// Deduplicate, sort, and return the sorted hash list alongside.
///
/// The hash list is sorted independently of the dependency order so two scans with the
/// same dependency set always produce byte-identical hash lists.
pub fn canonicalize(deps: &mut Vec<Dependency>) -> Vec<DependencyHash> {
    remove_exact_duplicates(deps);
    sort_dependencies(deps);
    let mut hashes: Vec<DependencyHash> = deps.iter().map(Dependency::hash).collect();
    hashes.sort();
    hashes
}
