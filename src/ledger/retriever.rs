//! Read-side queries over the ledger.

use super::record::RepositoryRecord;
use crate::error::{ErrorContext, LedgerError, NotFoundKind, OptionContext, Result};
use crate::model::{Dependency, DependencyDocument, DependencyHash, ScanDocument};
use crate::store::{DocType, DocumentStore, DocumentStoreExt, Query};
use crate::utils::repository_doc_id;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Dependencies of one recorded sha
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub repository: String,
    pub ref_name: String,
    pub sha: String,
    /// Sha of the realized entry the hashes were read from
    pub resolved_from: String,
    pub dependencies: Vec<Dependency>,
    /// Hashes whose dependency document is not visible yet
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<DependencyHash>,
}

/// A recorded sha whose scan holds at least one searched dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOccurrence {
    pub repository: String,
    /// Every tracked ref whose chain contains the sha
    pub refs: Vec<String>,
    pub sha: String,
    pub timestamp: DateTime<Utc>,
    pub matched: Vec<Dependency>,
}

/// Result of [`Retriever::search_dependency`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySearch {
    /// Dependency documents matching the name and version prefix
    pub dependencies: Vec<Dependency>,
    /// Ordered by repository, then newest scan first
    pub occurrences: Vec<DependencyOccurrence>,
}

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The repository record, or `NotFound(Repository)`
    pub fn repository(&self, full_name: &str) -> Result<RepositoryRecord> {
        self.store
            .get_as::<RepositoryRecord>(DocType::Repository, &repository_doc_id(full_name))
            .with_context(|| format!("loading repository record {full_name}"))?
            .or_not_found(NotFoundKind::Repository, full_name)
    }

    /// Ref name as stored: exact match first, then `refs/heads/<name>`
    pub fn canonical_ref(&self, record: &RepositoryRecord, name: &str) -> Result<String> {
        if record.find_ref(name).is_some() {
            return Ok(name.to_string());
        }
        let branch = format!("refs/heads/{name}");
        if record.find_ref(&branch).is_some() {
            return Ok(branch);
        }
        Err(crate::error::LedgerError::not_found(NotFoundKind::Ref, name))
    }

    /// Sorted hash list recorded for `sha`, with the ref it was found on and the realized sha
    pub fn hashes_by_sha(
        &self,
        full_name: &str,
        sha: &str,
    ) -> Result<(String, String, Vec<DependencyHash>)> {
        let record = self.repository(full_name)?;
        let ref_record = record
            .ref_containing(sha)
            .or_not_found(NotFoundKind::Sha, sha)?;
        let (target, hashes) = ref_record.resolve(sha)?;
        Ok((ref_record.name.clone(), target.to_string(), hashes.to_vec()))
    }

    pub fn dependencies_by_sha(&self, full_name: &str, sha: &str) -> Result<DependencyReport> {
        let (ref_name, resolved_from, hashes) = self.hashes_by_sha(full_name, sha)?;
        let (dependencies, unresolved) = self.resolve_hashes(&hashes)?;
        Ok(DependencyReport {
            repository: full_name.to_string(),
            ref_name,
            sha: sha.to_string(),
            resolved_from,
            dependencies,
            unresolved,
        })
    }

    /// Dependencies at the newest sha recorded on `ref_name`
    pub fn dependencies_by_ref(&self, full_name: &str, ref_name: &str) -> Result<DependencyReport> {
        let tip = self.ref_tip(full_name, ref_name)?;
        self.dependencies_by_sha(full_name, &tip)
    }

    /// Dependencies at the sha recorded for `tag`
    pub fn dependencies_by_tag(&self, full_name: &str, tag: &str) -> Result<DependencyReport> {
        let record = self.repository(full_name)?;
        let sha = record
            .tag_sha(tag)
            .or_not_found(NotFoundKind::Tag, tag)?
            .to_string();
        self.dependencies_by_sha(full_name, &sha)
    }

    /// Newest recorded sha of a ref
    pub fn ref_tip(&self, full_name: &str, ref_name: &str) -> Result<String> {
        let record = self.repository(full_name)?;
        let canonical = self.canonical_ref(&record, ref_name)?;
        let ref_record = record.ref_or_not_found(&canonical)?;
        ref_record
            .tip()
            .map(str::to_string)
            .or_not_found(NotFoundKind::Sha, format!("tip of {canonical}"))
    }

    /// Shas recorded on a ref, newest first
    pub fn list_shas(&self, full_name: &str, ref_name: &str) -> Result<Vec<String>> {
        let record = self.repository(full_name)?;
        let canonical = self.canonical_ref(&record, ref_name)?;
        Ok(record.ref_or_not_found(&canonical)?.webhook_order.clone())
    }

    /// Ref names tracked for a repository, in first-seen order
    pub fn list_refs(&self, full_name: &str) -> Result<Vec<String>> {
        let record = self.repository(full_name)?;
        Ok(record.refs.iter().map(|r| r.name.clone()).collect())
    }

    /// Tracked repositories, optionally only those under `org`
    pub fn list_repositories(&self, org: Option<&str>) -> Result<Vec<String>> {
        let query = match org {
            Some(org) => Query::wildcard("full_name", format!("{org}/*")),
            None => Query::MatchAll,
        };
        let records: Vec<RepositoryRecord> = self
            .store
            .search_as(DocType::Repository, &query)
            .context("listing repositories")?;
        let mut names: Vec<String> = records.into_iter().map(|r| r.full_name).collect();
        names.sort();
        Ok(names)
    }

    /// The persisted scan document for (repository, sha)
    pub fn scan_document(&self, full_name: &str, sha: &str) -> Result<ScanDocument> {
        let id = ScanDocument::doc_id(full_name, sha);
        self.store
            .get_as::<ScanDocument>(DocType::Scan, &id)
            .with_context(|| format!("loading scan document {id}"))?
            .or_not_found(NotFoundKind::Document, id)
    }

    /// Find where a dependency is used.
    ///
    /// Matches dependency documents by exact `name` and a `version_prefix` glob (`1.0`
    /// matches `1.0.2`; `None` matches every version), then every scan holding one of
    /// their hashes. A non-empty `repos` restricts the scans to those repositories.
    pub fn search_dependency(
        &self,
        name: &str,
        version_prefix: Option<&str>,
        repos: Option<&[String]>,
    ) -> Result<DependencySearch> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("dependency search needs a name"));
        }
        let dep_query = Query::must(vec![
            Query::term("name", name),
            Query::wildcard("version", format!("{}*", version_prefix.unwrap_or(""))),
        ]);
        let docs: Vec<DependencyDocument> = self
            .store
            .search_as(DocType::Dependency, &dep_query)
            .with_context(|| format!("searching dependencies named {name}"))?;
        if docs.is_empty() {
            return Ok(DependencySearch {
                dependencies: Vec::new(),
                occurrences: Vec::new(),
            });
        }

        let by_hash: BTreeMap<DependencyHash, Dependency> = docs
            .into_iter()
            .map(|doc| (doc.hashsum.clone(), Dependency::from(doc)))
            .collect();
        let mut must = vec![Query::should(
            by_hash
                .keys()
                .map(|hash| Query::term("dependencies", hash.as_str()))
                .collect(),
        )];
        if let Some(repos) = repos {
            must.push(Query::should(
                repos
                    .iter()
                    .map(|repo| Query::term("repo_fullname", repo.as_str()))
                    .collect(),
            ));
        }
        let scans: Vec<ScanDocument> = self
            .store
            .search_as(DocType::Scan, &Query::must(must))
            .with_context(|| format!("searching scans using {name}"))?;

        let mut records: BTreeMap<String, Option<RepositoryRecord>> = BTreeMap::new();
        let mut occurrences = Vec::with_capacity(scans.len());
        for scan in scans {
            if !records.contains_key(&scan.repo_fullname) {
                let record = self
                    .store
                    .get_as::<RepositoryRecord>(
                        DocType::Repository,
                        &repository_doc_id(&scan.repo_fullname),
                    )
                    .with_context(|| format!("loading repository record {}", scan.repo_fullname))?;
                records.insert(scan.repo_fullname.clone(), record);
            }
            let refs = match records.get(&scan.repo_fullname).and_then(Option::as_ref) {
                Some(record) => record
                    .refs
                    .iter()
                    .filter(|r| r.entry(&scan.sha).is_some())
                    .map(|r| r.name.clone())
                    .collect(),
                None => vec![scan.ref_name.clone()],
            };
            let mut matched: Vec<Dependency> = scan
                .dependencies
                .iter()
                .filter_map(|hash| by_hash.get(hash).cloned())
                .collect();
            matched.sort();
            occurrences.push(DependencyOccurrence {
                repository: scan.repo_fullname,
                refs,
                sha: scan.sha,
                timestamp: scan.timestamp,
                matched,
            });
        }
        occurrences.sort_by(|a, b| {
            a.repository
                .cmp(&b.repository)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| a.sha.cmp(&b.sha))
        });

        let dependencies: BTreeSet<Dependency> = by_hash.into_values().collect();
        Ok(DependencySearch {
            dependencies: dependencies.into_iter().collect(),
            occurrences,
        })
    }

    /// Look up dependency documents; hashes without a visible document are returned apart
    pub fn resolve_hashes(
        &self,
        hashes: &[DependencyHash],
    ) -> Result<(Vec<Dependency>, Vec<DependencyHash>)> {
        let mut resolved = Vec::with_capacity(hashes.len());
        let mut unresolved = Vec::new();
        for hash in hashes {
            match self
                .store
                .get_as::<DependencyDocument>(DocType::Dependency, hash.as_str())
                .with_context(|| format!("loading dependency {hash}"))?
            {
                Some(doc) => resolved.push(Dependency::from(doc)),
                None => unresolved.push(hash.clone()),
            }
        }
        resolved.sort();
        Ok((resolved, unresolved))
    }
}
