//! Persisted repository records and their per-ref entry chains.

use crate::error::{LedgerError, NotFoundKind, OptionContext, Result};
use crate::model::DependencyHash;
use crate::utils::{repository_doc_id, repository_short_name};
use serde::{Deserialize, Serialize};

/// Per-repository document: every tracked ref and every tag seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub full_name: String,
    pub name: String,
    #[serde(default)]
    pub refs: Vec<RefRecord>,
    #[serde(default)]
    pub tag_shas: Vec<TagSha>,
}

impl RepositoryRecord {
    pub fn new(full_name: &str) -> Self {
        Self {
            id: repository_doc_id(full_name),
            full_name: full_name.to_string(),
            name: repository_short_name(full_name).to_string(),
            refs: Vec::new(),
            tag_shas: Vec::new(),
        }
    }

    #[must_use]
    pub fn find_ref(&self, name: &str) -> Option<&RefRecord> {
        self.refs.iter().find(|r| r.name == name)
    }

    pub fn ref_or_not_found(&self, name: &str) -> Result<&RefRecord> {
        self.find_ref(name).or_not_found(NotFoundKind::Ref, name)
    }

    /// The ref record for `name`, created empty when missing
    pub fn ref_mut_or_insert(&mut self, name: &str) -> &mut RefRecord {
        let idx = match self.refs.iter().position(|r| r.name == name) {
            Some(idx) => idx,
            None => {
                self.refs.push(RefRecord::new(name));
                self.refs.len() - 1
            }
        };
        &mut self.refs[idx]
    }

    /// Most recently recorded sha for `tag`
    #[must_use]
    pub fn tag_sha(&self, tag: &str) -> Option<&str> {
        self.tag_shas
            .iter()
            .rev()
            .find(|t| t.tag == tag)
            .map(|t| t.sha.as_str())
    }

    /// Ref record holding `sha`, searched in ref order
    #[must_use]
    pub fn ref_containing(&self, sha: &str) -> Option<&RefRecord> {
        self.refs.iter().find(|r| r.entry(sha).is_some())
    }
}

/// Tag name to commit association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSha {
    pub tag: String,
    pub sha: String,
}

/// Ordered scan history of one ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    pub name: String,
    /// Newest first
    #[serde(default)]
    pub webhook_order: Vec<String>,
    #[serde(default)]
    pub entries: Vec<ScanEntry>,
}

impl RefRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            webhook_order: Vec::new(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entry(&self, sha: &str) -> Option<&ScanEntry> {
        self.entries.iter().find(|e| e.sha == sha)
    }

    /// Newest recorded sha
    #[must_use]
    pub fn tip(&self) -> Option<&str> {
        self.webhook_order.first().map(String::as_str)
    }

    /// Resolve `sha` to the realized entry holding its hashes, following at most one
    /// reference. Returns the realized sha alongside the hashes.
    pub fn resolve(&self, sha: &str) -> Result<(&str, &[DependencyHash])> {
        let entry = self
            .entry(sha)
            .or_not_found(NotFoundKind::Sha, format!("{sha} in {}", self.name))?;
        match &entry.content {
            EntryContent::Realized { dependencies } => {
                Ok((entry.sha.as_str(), dependencies.as_slice()))
            }
            EntryContent::Reference { entry_reference } => {
                let target = self.entry(entry_reference).ok_or_else(|| {
                    LedgerError::integrity(format!(
                        "entry {sha} on {} references missing entry {entry_reference}",
                        self.name
                    ))
                })?;
                match &target.content {
                    EntryContent::Realized { dependencies } => {
                        Ok((target.sha.as_str(), dependencies.as_slice()))
                    }
                    EntryContent::Reference { .. } => Err(LedgerError::integrity(format!(
                        "entry {sha} on {} references {entry_reference}, which is itself a reference",
                        self.name
                    ))),
                }
            }
        }
    }
}

/// One scan in a ref chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub sha: String,
    #[serde(flatten)]
    pub content: EntryContent,
}

/// Either the hash list itself or a pointer to an earlier identical entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Reference { entry_reference: String },
    Realized { dependencies: Vec<DependencyHash> },
}

impl ScanEntry {
    pub fn realized(sha: impl Into<String>, dependencies: Vec<DependencyHash>) -> Self {
        Self {
            sha: sha.into(),
            content: EntryContent::Realized { dependencies },
        }
    }

    pub fn reference(sha: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            content: EntryContent::Reference {
                entry_reference: target.into(),
            },
        }
    }

    #[must_use]
    pub fn reference_target(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Reference { entry_reference } => Some(entry_reference),
            EntryContent::Realized { .. } => None,
        }
    }
}
