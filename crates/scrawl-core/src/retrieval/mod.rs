//! Lexical retrieval: text analysis, the document index, and the
//! retrieval capability trait consumed by the orchestrator.

pub mod analyzer;
mod index;

pub use index::{DocumentIndex, PersistenceError};

use crate::types::Document;

/// Default number of results returned by a retrieval search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A document retrieval capability.
///
/// Implementations take `&self` so a single retriever can be shared by the
/// orchestrator and the host; interior mutability (and its locking
/// discipline) is the implementation's concern.
pub trait Retriever: Send + Sync {
    /// Return up to `limit` documents relevant to `query`, best first,
    /// with `relevance` populated.
    fn search(&self, query: &str, limit: usize) -> Vec<Document>;

    /// Insert or replace a document by id. Returns whether the document
    /// was accepted (content is not validated).
    fn index(&self, document: Document) -> bool;

    /// Remove a document by id. Returns whether one was found.
    fn remove(&self, id: &str) -> bool;

    /// Drop all documents.
    fn clear(&self);
}
