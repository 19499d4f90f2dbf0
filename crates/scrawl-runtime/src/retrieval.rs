//! Shared handle over the document index.
//!
//! [`DocumentIndex`] is single-owner; the orchestrator and the host both
//! need it, so [`SharedIndex`] guards one behind a `parking_lot::RwLock`
//! and implements [`Retriever`] on `&self`. Searches take the read lock;
//! mutations take the write lock.

use std::path::Path;

use parking_lot::RwLock;

use scrawl_core::retrieval::{DocumentIndex, PersistenceError, Retriever};
use scrawl_core::types::Document;

#[derive(Debug)]
pub struct SharedIndex {
    inner: RwLock<DocumentIndex>,
}

impl SharedIndex {
    /// Load (or start) an index persisted at `path`.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            inner: RwLock::new(DocumentIndex::open(path)),
        }
    }

    /// An index with no backing file.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(DocumentIndex::in_memory()),
        }
    }

    /// Flush to the backing file now, surfacing the error the drop-time
    /// flush would swallow.
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.inner.read().save()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn with_path<R>(&self, f: impl FnOnce(Option<&Path>) -> R) -> R {
        f(self.inner.read().path())
    }
}

impl Retriever for SharedIndex {
    fn search(&self, query: &str, limit: usize) -> Vec<Document> {
        self.inner.read().search(query, limit)
    }

    fn index(&self, document: Document) -> bool {
        self.inner.write().upsert(document);
        true
    }

    fn remove(&self, id: &str) -> bool {
        self.inner.write().remove(id)
    }

    fn clear(&self) {
        self.inner.write().clear()
    }
}
