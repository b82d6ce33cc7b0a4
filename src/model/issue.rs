//! Non-fatal findings attached to a scan.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A finding reported while parsing a manifest. Never aborts ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// The manifest pins a dependency to a range (or not at all) instead of one version
    WeakVersion {
        name: String,
        version: String,
        /// The constraint operator as written, empty when none was given
        operator: String,
    },
}

impl Issue {
    pub fn weak_version(
        name: impl Into<String>,
        version: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self::WeakVersion {
            name: name.into(),
            version: version.into(),
            operator: operator.into(),
        }
    }

    /// Name of the dependency the issue is about
    #[must_use]
    pub fn dependency_name(&self) -> &str {
        match self {
            Self::WeakVersion { name, .. } => name,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeakVersion {
                name,
                version,
                operator,
            } if operator.is_empty() && version.is_empty() => {
                write!(f, "{name} has no version constraint")
            }
            Self::WeakVersion {
                name,
                version,
                operator,
            } => write!(f, "{name} is not pinned to one version ({operator}{version})"),
        }
    }
}
