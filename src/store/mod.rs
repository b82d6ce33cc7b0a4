//! Document store abstraction.
//!
//! The ledger persists everything as JSON documents addressed by (type, id). The
//! [`DocumentStore`] trait is the only thing the rest of the crate sees, so a remote
//! search engine, the in-process [`MemoryStore`], and the on-disk [`FileStore`] are
//! interchangeable.

mod file;
mod memory;
mod query;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use query::{CompiledQuery, Query};

use crate::error::{LedgerError, Result, StoreErrorKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kinds of persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Per-repository record with its ref chains
    Repository,
    /// Per-(repository, sha) scan
    Scan,
    /// Content-addressed dependency, keyed by hash
    Dependency,
    /// Per-repository commit history tree
    History,
    /// Result of diffing a new commit against the previous tip
    Difference,
}

impl DocType {
    pub const ALL: [Self; 5] = [
        Self::Repository,
        Self::Scan,
        Self::Dependency,
        Self::History,
        Self::Difference,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Scan => "scan",
            Self::Dependency => "dependency",
            Self::History => "history",
            Self::Difference => "difference",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

/// Keyed JSON document storage with a query capability.
///
/// Implementations must be safe to share between pipeline workers.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when it does not exist
    fn get(&self, doc_type: DocType, id: &str) -> Result<Option<Value>>;

    /// Create a document unless one already exists under `id`.
    ///
    /// Returns `true` when this call created it. An existing document is left untouched
    /// and is not an error.
    fn create_or_skip(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<bool>;

    /// Create or replace a document
    fn put(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<()>;

    /// All documents of `doc_type` matching `query`, ordered by id
    fn search(&self, doc_type: DocType, query: &Query) -> Result<Vec<Hit>>;

    /// Short backend name for logs
    fn store_name(&self) -> &str;
}

/// Typed helpers over any [`DocumentStore`]
pub trait DocumentStoreExt: DocumentStore {
    fn get_as<T: DeserializeOwned>(&self, doc_type: DocType, id: &str) -> Result<Option<T>> {
        self.get(doc_type, id)?
            .map(|value| decode(doc_type, id, value))
            .transpose()
    }

    fn put_as<T: Serialize>(&self, doc_type: DocType, id: &str, doc: &T) -> Result<()> {
        self.put(doc_type, id, &encode(doc_type, id, doc)?)
    }

    fn create_or_skip_as<T: Serialize>(&self, doc_type: DocType, id: &str, doc: &T) -> Result<bool> {
        self.create_or_skip(doc_type, id, &encode(doc_type, id, doc)?)
    }

    fn exists(&self, doc_type: DocType, id: &str) -> Result<bool> {
        Ok(self.get(doc_type, id)?.is_some())
    }

    fn search_as<T: DeserializeOwned>(&self, doc_type: DocType, query: &Query) -> Result<Vec<T>> {
        self.search(doc_type, query)?
            .into_iter()
            .map(|hit| decode(doc_type, &hit.id, hit.source))
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

fn decode<T: DeserializeOwned>(doc_type: DocType, id: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        LedgerError::store(
            format!("decoding {doc_type} document {id}"),
            StoreErrorKind::Serialization(e.to_string()),
        )
    })
}

fn encode<T: Serialize>(doc_type: DocType, id: &str, doc: &T) -> Result<Value> {
    serde_json::to_value(doc).map_err(|e| {
        LedgerError::store(
            format!("encoding {doc_type} document {id}"),
            StoreErrorKind::Serialization(e.to_string()),
        )
    })
}

pub(crate) fn poisoned(backend: &str) -> LedgerError {
    LedgerError::store(
        format!("{backend} store"),
        StoreErrorKind::Unavailable("lock poisoned by a panicked writer".to_string()),
    )
}
