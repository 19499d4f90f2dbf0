//! Ollama local-model backend.
//!
//! Request shape: `{model, prompt, stream:false}` posted to
//! `{base}/api/generate`. No credential is involved, so the backend is
//! configured whenever it has a base URL. Connectivity is probed via
//! `GET {base}/api/tags`, which lists installed models.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use scrawl_core::types::{GenerationRequest, GenerationResponse};

use super::{Backend, BackendError};
use crate::codec::{extract_string_field, ProtocolError};
use crate::transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama2";

pub struct OllamaBackend {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaBackend")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: &'static str,
    prompt: String,
    stream: bool,
}

impl OllamaBackend {
    /// Create a backend. An empty `base_url` selects the local daemon's
    /// default address.
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: if base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                base_url
            },
            transport,
        }
    }

    fn build_payload(&self, request: &GenerationRequest) -> GenerateRequest {
        let prompt = if request.context.is_empty() {
            request.prompt.clone()
        } else {
            format!("{}\n\n{}", request.context, request.prompt)
        };

        GenerateRequest {
            model: DEFAULT_MODEL,
            prompt,
            stream: false,
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let body = serde_json::to_string(&self.build_payload(request))
            .map_err(ProtocolError::Encode)?;

        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        let response = self
            .transport
            .post(&format!("{}/api/generate", self.base_url), &body, &headers)
            .await?;

        if response.status != 200 {
            return Err(ProtocolError::Status(response.status).into());
        }

        let content = extract_string_field(&response.body, "response")?;
        Ok(GenerationResponse::ok(content))
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn test_connection(&self) -> bool {
        match self
            .transport
            .get(&format!("{}/api/tags", self.base_url), &[])
            .await
        {
            Ok(resp) => resp.status == 200,
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
