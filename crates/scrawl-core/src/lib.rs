//! # scrawl-core
//!
//! Deterministic core of the scrawl AI assistant: the data model, the
//! content filter engine, and the lexical retrieval index.
//!
//! This crate performs no network I/O and holds no process-wide state:
//! every engine and index is an owned value. The async network runtime
//! (backend dispatch, raw-socket transport) lives in `scrawl-runtime`.
//!
//! ## Key guarantees
//!
//! 1. **Deterministic**: filtering and retrieval scoring depend only on
//!    their inputs and configuration
//! 2. **Non-fatal persistence**: a missing or damaged index file degrades
//!    to an empty index; a failed save leaves documents in memory
//! 3. **Per-call filter verdicts**: rejection reasons are returned with
//!    the decision, never stored on the engine
//!
//! ## Example
//!
//! ```rust
//! use scrawl_core::{ContentFilterEngine, FilterConfig, GenerationRequest};
//!
//! let engine = ContentFilterEngine::new(FilterConfig::moderate());
//! let request = GenerationRequest::new("Summarize my meeting notes");
//! assert!(engine.is_allowed(&request.prompt, &request));
//! ```

pub mod config;
pub mod filter;
pub mod retrieval;
pub mod types;

// Re-export main types at crate root
pub use config::{ConfigStore, MemoryConfigStore};
pub use filter::{ContentFilterEngine, FilterDecision};
pub use retrieval::{DocumentIndex, PersistenceError, Retriever, DEFAULT_SEARCH_LIMIT};
pub use types::{
    BackendKind, Document, FilterConfig, FilterLevel, GenerationRequest, GenerationResponse,
};
