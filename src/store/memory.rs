use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::Stage;
use crate::store::aggregate::{referenced_collections, run_pipeline};
use crate::store::traits::{stamp_document, DocumentStore, DocumentWriter};

/// Process-local document store, used for development and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Snapshot of the pipeline's base collection and every joined one,
    /// taken under a single read lock
    fn snapshot(&self, collection: &str, pipeline: &[Stage]) -> (Vec<Value>, HashMap<String, Vec<Value>>) {
        let guard = self.collections.read();
        let base = guard.get(collection).cloned().unwrap_or_default();
        let joined = referenced_collections(pipeline)
            .into_iter()
            .filter_map(|name| {
                let docs = guard.get(&name)?.clone();
                Some((name, docs))
            })
            .collect();
        (base, joined)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> Result<Vec<Value>> {
        let (base, joined) = self.snapshot(collection, pipeline);
        Ok(run_pipeline(base, pipeline, &joined))
    }
}

#[async_trait::async_trait]
impl DocumentWriter for MemoryStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<usize> {
        let stamped = documents
            .into_iter()
            .map(stamp_document)
            .collect::<Result<Vec<_>>>()?;
        let written = stamped.len();

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend(stamped);

        Ok(written)
    }
}
