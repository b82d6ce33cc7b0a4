//! Stage 3: commit resolved scans into entry chains, one repository at a time.

use super::resolve_stage::ResolvedScan;
use crate::error::{LedgerError, Result, StoreErrorKind};
use crate::history::update_history;
use crate::ledger::{Ledger, RecordOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per repository, created on first use
#[derive(Default)]
pub(crate) struct RepoLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RepoLocks {
    pub(crate) fn lock_for(&self, full_name: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| poisoned("repository lock table"))?;
        Ok(Arc::clone(locks.entry(full_name.to_string()).or_default()))
    }
}

fn poisoned(what: &str) -> LedgerError {
    LedgerError::store(
        what,
        StoreErrorKind::Unavailable("lock poisoned by a panicked worker".into()),
    )
}

/// What stage 3 did with a resolved scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Committed {
    Recorded {
        outcome: RecordOutcome,
        history_written: bool,
    },
    /// Another task committed the same sha first
    AlreadyScanned,
}

pub(crate) fn commit(ledger: &Ledger, locks: &RepoLocks, resolved: &ResolvedScan) -> Result<Committed> {
    let full_name = resolved.scan.repo_full_name.as_str();
    let lock = locks.lock_for(full_name)?;
    let _guard = lock.lock().map_err(|_| poisoned(full_name))?;

    // stage 1 checked before the checkout; a concurrent task may have won since
    if ledger.scan_exists(full_name, &resolved.scan.sha)? {
        return Ok(Committed::AlreadyScanned);
    }

    let outcome = ledger.record_scan(&resolved.scan, &resolved.task.ref_name, &resolved.hashes)?;

    let history_written = match &resolved.history {
        Some(snapshot) => match update_history(ledger.store().as_ref(), full_name, snapshot) {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(repo = full_name, error = %e, "history update failed");
                false
            }
        },
        None => false,
    };

    Ok(Committed::Recorded {
        outcome,
        history_written,
    })
}
