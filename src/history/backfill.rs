//! Planning scans for tagged commits that were never ingested.

use super::tree::HistoryTree;
use crate::ledger::{RepositoryRecord, TAG_REF_PREFIX};
use crate::pipeline::IngestTask;

/// One task per tagged commit that no recorded ref contains, in sha order.
///
/// A commit carrying several tags is planned once, under its first tag; the pipeline
/// skips shas that already have a scan, so further tasks for it would be dropped anyway.
#[must_use]
pub fn plan_backfill(
    full_name: &str,
    tree: &HistoryTree,
    record: Option<&RepositoryRecord>,
) -> Vec<IngestTask> {
    tree.nodes()
        .filter(|node| {
            record.map_or(true, |record| record.ref_containing(&node.sha).is_none())
        })
        .filter_map(|node| {
            let tag = node.tags.iter().min()?;
            Some(IngestTask::new(
                full_name,
                node.sha.clone(),
                format!("{TAG_REF_PREFIX}{tag}"),
            ))
        })
        .collect()
}
