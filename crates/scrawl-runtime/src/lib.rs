//! # scrawl-runtime
//!
//! Async runtime of the scrawl AI assistant: the raw-socket HTTP
//! transport, provider wire codecs and backends, the backend registry,
//! and the [`Assistant`] orchestrator that ties filtering, retrieval
//! augmentation, and dispatch together.
//!
//! The deterministic pieces (data model, content filter, retrieval index)
//! live in `scrawl-core`; this crate adds everything that touches the
//! network or a tokio runtime.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scrawl_core::{BackendKind, MemoryConfigStore};
//! use scrawl_runtime::{Assistant, SharedIndex};
//!
//! # async fn run() {
//! let mut assistant = Assistant::new(Arc::new(MemoryConfigStore::new()));
//! assistant.configure(BackendKind::OpenAi, "sk-...", "");
//! assistant.switch_backend(BackendKind::OpenAi);
//! assistant.set_retriever(Arc::new(SharedIndex::in_memory()));
//!
//! let response = assistant.summarize("Qui docet, discit.").await;
//! if response.success {
//!     println!("{}", response.content);
//! }
//! # }
//! ```

pub mod codec;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod retrieval;
pub mod transport;

// Re-export main types at crate root
pub use codec::{extract_string_field, ProtocolError};
pub use orchestrator::Assistant;
pub use providers::{Backend, BackendError};
pub use registry::BackendRegistry;
pub use retrieval::SharedIndex;
pub use transport::{HttpResponse, HttpTransport, TcpTransport, TransportError};
