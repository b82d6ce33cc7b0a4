//! Appending scans to a ref chain with one-hop deduplication.
//!
//! A new scan whose hash set equals the nearest realized entry at the front of the ref
//! is stored as a reference to that entry instead of repeating the hashes. Because the
//! target is always realized, every reference resolves in exactly one hop.

use super::record::{RepositoryRecord, ScanEntry, TagSha};
use crate::error::{LedgerError, Result};
use crate::model::DependencyHash;
use std::collections::BTreeSet;

pub const TAG_REF_PREFIX: &str = "refs/tags/";

/// How a newly appended scan was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Full hash list stored
    Realized,
    /// Stored as a reference to `target`
    Reference { target: String },
}

/// Result of [`append_scan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    pub kind: EntryKind,
    /// Tip of the ref before this append, the natural diff base
    pub previous_tip: Option<String>,
}

/// Tag name for a `refs/tags/<tag>` ref
#[must_use]
pub fn tag_name(ref_name: &str) -> Option<&str> {
    ref_name
        .strip_prefix(TAG_REF_PREFIX)
        .filter(|tag| !tag.is_empty())
}

/// Record `sha` with `hashes` at the front of `ref_name`.
///
/// Fails without touching `record` when `sha` is already on the ref or the chain is
/// inconsistent.
pub fn append_scan(
    record: &mut RepositoryRecord,
    ref_name: &str,
    sha: &str,
    hashes: &[DependencyHash],
) -> Result<Appended> {
    if sha.trim().is_empty() {
        return Err(LedgerError::validation("cannot record an empty sha"));
    }

    let ref_record = record.ref_mut_or_insert(ref_name);
    if ref_record.entry(sha).is_some() {
        return Err(LedgerError::validation(format!(
            "{sha} is already recorded on {ref_name}"
        )));
    }

    let previous_tip = ref_record.tip().map(str::to_string);
    let entry = match &previous_tip {
        Some(tip) => {
            let (target, target_hashes) = ref_record.resolve(tip)?;
            if same_set(hashes, target_hashes) {
                ScanEntry::reference(sha, target)
            } else {
                ScanEntry::realized(sha, hashes.to_vec())
            }
        }
        None => ScanEntry::realized(sha, hashes.to_vec()),
    };

    let kind = match entry.reference_target() {
        Some(target) => EntryKind::Reference {
            target: target.to_string(),
        },
        None => EntryKind::Realized,
    };

    ref_record.webhook_order.insert(0, sha.to_string());
    ref_record.entries.push(entry);

    if let Some(tag) = tag_name(ref_name) {
        record.tag_shas.push(TagSha {
            tag: tag.to_string(),
            sha: sha.to_string(),
        });
    }

    Ok(Appended { kind, previous_tip })
}

fn same_set(a: &[DependencyHash], b: &[DependencyHash]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(ids: &[&str]) -> Vec<DependencyHash> {
        ids.iter().map(|id| DependencyHash::from_hex(*id)).collect()
    }

    const MAIN: &str = "refs/heads/main";

    #[test]
    fn test_first_entry_is_realized() {
        let mut record = RepositoryRecord::new("acme/api");
        let out = append_scan(&mut record, MAIN, "a", &h(&["x"])).unwrap();
        assert_eq!(out.kind, EntryKind::Realized);
        assert_eq!(out.previous_tip, None);
    }

    #[test]
    fn test_identical_commits_reference_first_realized() {
        let mut record = RepositoryRecord::new("acme/api");
        append_scan(&mut record, MAIN, "a", &h(&["x", "y"])).unwrap();
        for sha in ["b", "c", "d"] {
            let out = append_scan(&mut record, MAIN, sha, &h(&["y", "x"])).unwrap();
            assert_eq!(
                out.kind,
                EntryKind::Reference {
                    target: "a".to_string()
                }
            );
        }
        let main = record.find_ref(MAIN).unwrap();
        assert_eq!(main.webhook_order, vec!["d", "c", "b", "a"]);
        for sha in ["b", "c", "d"] {
            assert_eq!(main.resolve(sha).unwrap().0, "a");
        }
    }

    #[test]
    fn test_changed_set_is_realized() {
        let mut record = RepositoryRecord::new("acme/api");
        append_scan(&mut record, MAIN, "a", &h(&["x"])).unwrap();
        let out = append_scan(&mut record, MAIN, "b", &h(&["x", "z"])).unwrap();
        assert_eq!(out.kind, EntryKind::Realized);
        assert_eq!(out.previous_tip.as_deref(), Some("a"));
    }

    #[test]
    fn test_duplicate_sha_rejected_without_change() {
        let mut record = RepositoryRecord::new("acme/api");
        append_scan(&mut record, MAIN, "a", &h(&["x"])).unwrap();
        let before = record.clone();
        assert!(append_scan(&mut record, MAIN, "a", &h(&["x"])).is_err());
        assert_eq!(record, before);
    }

    #[test]
    fn test_same_sha_on_two_refs_is_allowed() {
        let mut record = RepositoryRecord::new("acme/api");
        append_scan(&mut record, MAIN, "a", &h(&["x"])).unwrap();
        append_scan(&mut record, "refs/heads/dev", "a", &h(&["x"])).unwrap();
        assert_eq!(record.refs.len(), 2);
    }

    #[test]
    fn test_tag_ref_records_tag_sha() {
        let mut record = RepositoryRecord::new("acme/api");
        append_scan(&mut record, "refs/tags/v1.0", "a", &h(&["x"])).unwrap();
        assert_eq!(record.tag_sha("v1.0"), Some("a"));
        assert_eq!(tag_name("refs/tags/release/2"), Some("release/2"));
        assert_eq!(tag_name("refs/heads/main"), None);
    }
}
