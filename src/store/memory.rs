//! In-process document store.

use super::{poisoned, DocType, DocumentStore, Hit, Query};
use crate::error::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

pub(crate) type Collections = HashMap<DocType, BTreeMap<String, Value>>;

/// Thread-safe store holding every document in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_collections(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Number of documents of one type
    pub fn count(&self, doc_type: DocType) -> Result<usize> {
        let guard = self.collections.read().map_err(|_| poisoned(self.store_name()))?;
        Ok(guard.get(&doc_type).map_or(0, BTreeMap::len))
    }

    /// Snapshot of one collection, used by the file store when writing through
    pub(crate) fn snapshot(&self, doc_type: DocType) -> Result<BTreeMap<String, Value>> {
        let guard = self.collections.read().map_err(|_| poisoned(self.store_name()))?;
        Ok(guard.get(&doc_type).cloned().unwrap_or_default())
    }

    /// Swap in a whole collection once the file store has persisted it
    pub(crate) fn replace_collection(
        &self,
        doc_type: DocType,
        docs: BTreeMap<String, Value>,
    ) -> Result<()> {
        let mut guard = self.collections.write().map_err(|_| poisoned(self.store_name()))?;
        guard.insert(doc_type, docs);
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, doc_type: DocType, id: &str) -> Result<Option<Value>> {
        let guard = self.collections.read().map_err(|_| poisoned(self.store_name()))?;
        Ok(guard.get(&doc_type).and_then(|c| c.get(id)).cloned())
    }

    fn create_or_skip(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<bool> {
        let mut guard = self.collections.write().map_err(|_| poisoned(self.store_name()))?;
        let collection = guard.entry(doc_type).or_default();
        if collection.contains_key(id) {
            return Ok(false);
        }
        collection.insert(id.to_string(), doc.clone());
        Ok(true)
    }

    fn put(&self, doc_type: DocType, id: &str, doc: &Value) -> Result<()> {
        let mut guard = self.collections.write().map_err(|_| poisoned(self.store_name()))?;
        guard
            .entry(doc_type)
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    fn search(&self, doc_type: DocType, query: &Query) -> Result<Vec<Hit>> {
        let compiled = query.compile()?;
        let guard = self.collections.read().map_err(|_| poisoned(self.store_name()))?;
        let Some(collection) = guard.get(&doc_type) else {
            return Ok(Vec::new());
        };
        Ok(collection
            .iter()
            .filter(|(_, doc)| compiled.matches(doc))
            .map(|(id, doc)| Hit {
                id: id.clone(),
                source: doc.clone(),
            })
            .collect())
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
