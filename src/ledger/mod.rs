//! Entry chains and scan storage.
//!
//! A [`Ledger`] commits scans into per-(repository, ref) chains kept in the repository
//! record, and writes the per-sha [`ScanDocument`]. The [`Retriever`] answers read-side
//! queries over the same documents.
//!
//! Commit order is repository record first, scan document second. A crash in between
//! leaves a chain entry without its scan document; the next delivery of that sha
//! repairs it.

mod chain;
mod record;
mod retriever;

pub use chain::{append_scan, tag_name, Appended, EntryKind, TAG_REF_PREFIX};
pub use record::{EntryContent, RefRecord, RepositoryRecord, ScanEntry, TagSha};
pub use retriever::{DependencyOccurrence, DependencyReport, DependencySearch, Retriever};

use crate::error::{ErrorContext, LedgerError, Result};
use crate::model::{DependencyHash, Scan, ScanDocument};
use crate::store::{DocType, DocumentStore, DocumentStoreExt};
use crate::utils::{repository_doc_id, short_sha};
use std::sync::Arc;

/// What [`Ledger::record_scan`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended to the chain
    Appended(Appended),
    /// The sha was already on the chain but its scan document was missing; only the
    /// document was written
    Repaired,
}

impl RecordOutcome {
    /// The ref tip before this scan, when a new entry was appended
    #[must_use]
    pub fn previous_tip(&self) -> Option<&str> {
        match self {
            Self::Appended(appended) => appended.previous_tip.as_deref(),
            Self::Repaired => None,
        }
    }
}

/// Write side of the ledger
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn load_repository(&self, full_name: &str) -> Result<Option<RepositoryRecord>> {
        self.store
            .get_as(DocType::Repository, &repository_doc_id(full_name))
            .with_context(|| format!("loading repository record {full_name}"))
    }

    /// True when a scan document exists for (repository, sha)
    pub fn scan_exists(&self, full_name: &str, sha: &str) -> Result<bool> {
        self.store
            .exists(DocType::Scan, &ScanDocument::doc_id(full_name, sha))
            .with_context(|| format!("checking scan {full_name}@{}", short_sha(sha)))
    }

    /// Commit `scan` to the chain of `ref_name`.
    ///
    /// `hashes` must be the sorted hash list of `scan.dependencies`. Callers serialize
    /// calls per repository; the record is read, modified and written back without any
    /// store-level locking.
    pub fn record_scan(
        &self,
        scan: &Scan,
        ref_name: &str,
        hashes: &[DependencyHash],
    ) -> Result<RecordOutcome> {
        let full_name = scan.repo_full_name.as_str();
        let existing = self.load_repository(full_name)?;
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(|| RepositoryRecord::new(full_name));

        let already_on_ref = record
            .find_ref(ref_name)
            .is_some_and(|r| r.entry(&scan.sha).is_some());
        if already_on_ref {
            if self.scan_exists(full_name, &scan.sha)? {
                return Err(LedgerError::validation(format!(
                    "{full_name}@{} is already recorded on {ref_name}",
                    scan.sha
                )));
            }
            self.write_scan_document(scan, ref_name, hashes)?;
            tracing::warn!(
                repo = full_name,
                sha = short_sha(&scan.sha),
                ref_name,
                "repaired missing scan document"
            );
            return Ok(RecordOutcome::Repaired);
        }

        let appended = append_scan(&mut record, ref_name, &scan.sha, hashes)
            .with_context(|| format!("appending {} to {ref_name}", short_sha(&scan.sha)))?;

        if is_new {
            let created = self
                .store
                .create_or_skip_as(DocType::Repository, &record.id, &record)
                .with_context(|| format!("creating repository record {full_name}"))?;
            if !created {
                return Err(LedgerError::integrity(format!(
                    "repository record {full_name} was created concurrently"
                )));
            }
        } else {
            self.store
                .put_as(DocType::Repository, &record.id, &record)
                .with_context(|| format!("updating repository record {full_name}"))?;
        }

        self.write_scan_document(scan, ref_name, hashes)?;

        tracing::info!(
            repo = full_name,
            sha = short_sha(&scan.sha),
            ref_name,
            kind = ?appended.kind,
            dependencies = hashes.len(),
            "recorded scan"
        );
        Ok(RecordOutcome::Appended(appended))
    }

    fn write_scan_document(
        &self,
        scan: &Scan,
        ref_name: &str,
        hashes: &[DependencyHash],
    ) -> Result<()> {
        let doc = ScanDocument::from_scan(scan, ref_name, hashes.to_vec());
        let id = ScanDocument::doc_id(&scan.repo_full_name, &scan.sha);
        self.store
            .put_as(DocType::Scan, &id, &doc)
            .with_context(|| format!("writing scan document {id}"))
    }
}
