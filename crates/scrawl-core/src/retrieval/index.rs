//! In-memory document index with flat-file persistence.
//!
//! Documents live in insertion order in a `Vec`; search scores every
//! document with the lexical overlap measure from [`analyzer`] and returns
//! the best matches. The index loads itself from its backing file at
//! construction and flushes back on [`save`](DocumentIndex::save) and on
//! drop.
//!
//! ## File format
//!
//! One record per document, line oriented, UTF-8:
//!
//! ```text
//! ---DOC_START---
//! ID:<id>
//! TITLE:<title>
//! SOURCE:<source>
//! CONTENT:<first content line>
//! <further content lines>...
//! ---DOC_END---
//! ```
//!
//! The content field runs until the end sentinel, so embedded newlines
//! survive a round trip. Tags and relevance scores are not persisted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::analyzer;
use crate::types::Document;

const DOC_START: &str = "---DOC_START---";
const DOC_END: &str = "---DOC_END---";

/// Minimum similarity score for a document to appear in search results.
const SCORE_THRESHOLD: f32 = 0.1;

/// Errors from index persistence. Callers treat these as non-fatal: a load
/// failure degrades to an empty index and a save failure leaves documents
/// available in memory.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read index file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write index file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An insertion-ordered document collection with lexical search.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    path: Option<PathBuf>,
    documents: Vec<Document>,
}

impl DocumentIndex {
    /// Create an index with no backing file. Nothing is persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open an index backed by `path`, loading any existing records.
    ///
    /// A missing file yields an empty index. Malformed records degrade
    /// silently: well-formed records around them still load.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let documents = match fs::read_to_string(&path) {
            Ok(text) => parse_records(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "index load failed, starting empty");
                Vec::new()
            }
        };

        Self {
            path: Some(path),
            documents,
        }
    }

    /// Search for the `limit` documents most relevant to `query`.
    ///
    /// Results carry their similarity score in `relevance` and are ordered
    /// by descending score; ties keep insertion order (stable sort).
    /// Documents scoring at or below the threshold are excluded.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Document> {
        let mut scored: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let score = analyzer::similarity(query, &doc.content);
                (score > SCORE_THRESHOLD).then_some((score, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, doc)| {
                let mut result = doc.clone();
                result.relevance = score;
                result
            })
            .collect()
    }

    /// Insert a document, replacing any existing document with the same id.
    pub fn upsert(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    /// Remove the document with the given id. Returns whether one was found.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.documents.iter().position(|d| d.id == id) {
            Some(pos) => {
                self.documents.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop all documents. In memory only until the next save.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Flush all documents to the backing file, if there is one.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        fs::write(path, render_records(&self.documents)).map_err(|source| {
            PersistenceError::Write {
                path: path.clone(),
                source,
            }
        })
    }

    /// The backing file path, when the index is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for DocumentIndex {
    fn drop(&mut self) {
        // Teardown flush; failures leave the in-memory state as the only copy.
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "index save on drop failed");
        }
    }
}

fn render_records(documents: &[Document]) -> String {
    let mut out = String::new();
    for doc in documents {
        out.push_str(DOC_START);
        out.push('\n');
        out.push_str("ID:");
        out.push_str(&doc.id);
        out.push('\n');
        out.push_str("TITLE:");
        out.push_str(&doc.title);
        out.push('\n');
        out.push_str("SOURCE:");
        out.push_str(&doc.source);
        out.push('\n');
        out.push_str("CONTENT:");
        out.push_str(&doc.content);
        out.push('\n');
        out.push_str(DOC_END);
        out.push('\n');
    }
    out
}

fn parse_records(text: &str) -> Vec<Document> {
    let mut documents = Vec::new();
    let mut current: Option<Document> = None;
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if line == DOC_START {
            current = Some(Document::default());
            continue;
        }
        if line == DOC_END {
            if let Some(doc) = current.take() {
                documents.push(doc);
            }
            continue;
        }
        // Lines outside a record are garbage and ignored.
        let Some(doc) = current.as_mut() else {
            continue;
        };

        if let Some(id) = line.strip_prefix("ID:") {
            doc.id = id.to_string();
        } else if let Some(title) = line.strip_prefix("TITLE:") {
            doc.title = title.to_string();
        } else if let Some(source) = line.strip_prefix("SOURCE:") {
            doc.source = source.to_string();
        } else if let Some(first) = line.strip_prefix("CONTENT:") {
            // Content runs until the end sentinel; a record truncated
            // before the sentinel is dropped.
            let mut content = first.to_string();
            let mut terminated = false;
            for content_line in lines.by_ref() {
                if content_line == DOC_END {
                    terminated = true;
                    break;
                }
                content.push('\n');
                content.push_str(content_line);
            }
            doc.content = content;
            if terminated {
                if let Some(done) = current.take() {
                    documents.push(done);
                }
            } else {
                current = None;
            }
        }
        // Unrecognized lines inside a record are skipped.
    }

    documents
}
