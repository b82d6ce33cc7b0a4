//! Scan results and their persisted document shapes.

use super::{Dependency, DependencyHash, Issue};
use crate::utils::repository_short_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical dependency set of one repository at one commit.
///
/// Created once per (repository, sha) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub repo_full_name: String,
    pub sha: String,
    /// Refs pointing at `sha` when it was scanned
    #[serde(default)]
    pub refs: Vec<String>,
    /// Deduplicated and sorted by (name, version, ecosystem)
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Manifest paths (relative to the checkout) that contributed
    #[serde(default)]
    pub files_scanned: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Scan {
    /// Sorted hash list of this scan's dependencies
    #[must_use]
    pub fn hashes(&self) -> Vec<DependencyHash> {
        let mut hashes: Vec<DependencyHash> = self.dependencies.iter().map(Dependency::hash).collect();
        hashes.sort();
        hashes
    }
}

/// Persisted per-(repository, sha) scan document.
///
/// Only hashes are stored; the dependencies themselves live in [`DependencyDocument`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDocument {
    pub repo_fullname: String,
    pub repo_name: String,
    pub ref_name: String,
    pub sha: String,
    pub timestamp: DateTime<Utc>,
    pub dependencies: Vec<DependencyHash>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ScanDocument {
    /// Store id of the scan document for `repo_full_name` at `sha`
    #[must_use]
    pub fn doc_id(repo_full_name: &str, sha: &str) -> String {
        format!("{}@{sha}", crate::utils::repository_doc_id(repo_full_name))
    }

    pub fn from_scan(scan: &Scan, ref_name: &str, hashes: Vec<DependencyHash>) -> Self {
        Self {
            repo_fullname: scan.repo_full_name.clone(),
            repo_name: repository_short_name(&scan.repo_full_name).to_string(),
            ref_name: ref_name.to_string(),
            sha: scan.sha.clone(),
            timestamp: scan.timestamp,
            dependencies: hashes,
            issues: scan.issues.clone(),
            files: scan.files_scanned.clone(),
        }
    }
}

/// Content-addressed document for a single dependency, keyed by its hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDocument {
    pub hashsum: DependencyHash,
    pub name: String,
    pub version: String,
    pub language: super::Ecosystem,
}

impl From<&Dependency> for DependencyDocument {
    fn from(dep: &Dependency) -> Self {
        Self {
            hashsum: dep.hash(),
            name: dep.name.clone(),
            version: dep.version.clone(),
            language: dep.ecosystem,
        }
    }
}

impl From<DependencyDocument> for Dependency {
    fn from(doc: DependencyDocument) -> Self {
        Self {
            name: doc.name,
            version: doc.version,
            ecosystem: doc.language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ecosystem;

    #[test]
    fn test_scan_document_shape() {
        let scan = Scan {
            repo_full_name: "acme/api".to_string(),
            sha: "abc".to_string(),
            refs: vec!["refs/heads/main".to_string()],
            dependencies: vec![Dependency::new("numpy", "1.2", Ecosystem::Python)],
            issues: Vec::new(),
            files_scanned: vec!["requirements.txt".to_string()],
            timestamp: Utc::now(),
        };
        let doc = ScanDocument::from_scan(&scan, "refs/heads/main", scan.hashes());
        assert_eq!(doc.repo_name, "api");
        assert_eq!(doc.dependencies.len(), 1);
        assert_eq!(ScanDocument::doc_id("acme/api", "abc"), "acme_api@abc");

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("repo_fullname").is_some());
        assert!(json["dependencies"][0].is_string());
    }

    #[test]
    fn test_dependency_document_roundtrip_keeps_hash() {
        let dep = Dependency::new("org.slf4j:slf4j-api", "1.7.30", Ecosystem::Maven);
        let doc = DependencyDocument::from(&dep);
        assert_eq!(doc.hashsum, dep.hash());
        assert_eq!(serde_json::to_value(&doc).unwrap()["language"], "maven");
        assert_eq!(Dependency::from(doc), dep);
    }
}
