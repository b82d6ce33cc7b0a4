//! JSON-file-backed document store.
//!
//! Layout: one `<type>.json` file per document type under the store root, each holding
//! an `id -> document` object. Reads are served from memory. Writes are serialized per
//! store: each one rewrites the affected file through a temp file and rename, and only
//! then becomes visible in memory.

use super::memory::{Collections, MemoryStore};
use super::{DocType, DocumentStore, Hit, Query};
use crate::error::{LedgerError, Result, StoreErrorKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    memory: MemoryStore,
    /// Serializes write-through so two writers cannot interleave file replacement
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| LedgerError::io(&root, e))?;

        let mut collections = Collections::new();
        for doc_type in DocType::ALL {
            let path = collection_path(&root, doc_type);
            if !path.exists() {
                continue;
            }
            let raw = fs::read_to_string(&path).map_err(|e| LedgerError::io(&path, e))?;
            let docs: BTreeMap<String, Value> = serde_json::from_str(&raw).map_err(|e| {
                LedgerError::store(
                    format!("loading {}", path.display()),
                    StoreErrorKind::Serialization(e.to_string()),
                )
            })?;
            tracing::debug!(doc_type = %doc_type, count = docs.len(), "loaded collection");
            collections.insert(doc_type, docs);
        }

        Ok(Self {
            root,
            memory: MemoryStore::from_collections(collections),
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn persist(&self, doc_type: DocType, docs: &BTreeMap<String, Value>) -> Result<()> {
        let path = collection_path(&self.root, doc_type);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(docs)?;
        fs::write(&tmp, body).map_err(|e| LedgerError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| LedgerError::io(&path, e))?;
        Ok(())
    }

    /// Apply `op` to a copy of the collection, persist it, then publish it to memory.
    ///
    /// A failed file write leaves memory untouched. `op` returns whether it changed
    /// anything; unchanged collections are not rewritten.
    fn write_through<T>(
        &self,
        doc_type: DocType,
        op: impl FnOnce(&mut BTreeMap<String, Value>) -> (T, bool),
    ) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| super::poisoned(self.store_name()))?;
        let mut docs = self.memory.snapshot(doc_type)?;
        let (value, changed) = op(&mut docs);
        if changed {
            self.persist(doc_type, &docs)?;
            self.memory.replace_collection(doc_type, docs)?;
        }
        Ok(value)
    }
}

fn collection_path(root: &Path, doc_type: DocType) -> PathBuf {
    root.join(format!("{}.json", doc_type.as_str()))
}

impl DocumentStore for FileStore {
    fn get(&self, doc_type: DocType, id: &str) -> Result<Option<Value>> {
        self.memory.get(doc_type, id)
    }

    fn create_or_skip(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<bool> {
        // Already present: nothing to persist, so no need to queue on the write lock
        if self.memory.get(doc_type, id)?.is_some() {
            return Ok(false);
        }
        self.write_through(doc_type, |docs| {
            if docs.contains_key(id) {
                return (false, false);
            }
            docs.insert(id.to_string(), doc.clone());
            (true, true)
        })
    }

    fn put(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<()> {
        self.write_through(doc_type, |docs| {
            docs.insert(id.to_string(), doc.clone());
            ((), true)
        })
    }

    fn search(&self, doc_type: DocType, query: &Query) -> Result<Vec<Hit>> {
        self.memory.search(doc_type, query)
    }

    fn store_name(&self) -> &str {
        "file"
    }
}
