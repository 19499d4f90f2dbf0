//! AI backend abstractions and the built-in wire implementations.
//!
//! Each backend turns a [`GenerationRequest`] into its provider's literal
//! request shape, performs one HTTP exchange through the shared
//! [`HttpTransport`](crate::transport::HttpTransport), and extracts the
//! generated text by field scanning (see [`codec`](crate::codec)).
//!
//! ## Security
//!
//! All backends hold their API key in an [`ApiCredential`]; see the
//! [`secrets`] module.

use async_trait::async_trait;
use thiserror::Error;

use scrawl_core::types::{GenerationRequest, GenerationResponse};

use crate::codec::ProtocolError;
use crate::transport::TransportError;

mod anthropic;
mod ollama;
mod openai;
pub mod secrets;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use secrets::{ApiCredential, CredentialSource};

/// Errors from AI backends. Converted to failure responses at the
/// orchestrator boundary; they never cross the public surface as faults.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A text-generation backend.
///
/// Implementations are shared behind `Arc<dyn Backend>`; all methods take
/// `&self` and implementations hold no per-request mutable state.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one generation exchange.
    ///
    /// A successful result carries the extracted text verbatim (escape
    /// sequences included, per the codec contract).
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError>;

    /// Whether this backend has the configuration it needs to attempt a
    /// request (for keyed providers, a non-empty credential).
    fn is_configured(&self) -> bool;

    /// Probe the backend with a minimal request.
    async fn test_connection(&self) -> bool;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}
