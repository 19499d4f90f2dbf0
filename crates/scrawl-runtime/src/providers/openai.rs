//! OpenAI chat-completion backend.
//!
//! Request shape: `{model, messages:[{role,content}...], max_tokens,
//! temperature}` posted to `{base}/chat/completions` with a bearer token.
//! The generated text is the first `"content"` string in the response.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use scrawl_core::types::{GenerationRequest, GenerationResponse};

use super::{ApiCredential, Backend, BackendError, CredentialSource};
use crate::codec::{extract_string_field, ProtocolError};
use crate::transport::HttpTransport;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub struct OpenAiBackend {
    credential: ApiCredential,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl OpenAiBackend {
    /// Create a backend. An empty `base_url` selects the public endpoint.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Settings,
                "OpenAI API key",
            ),
            base_url: if base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                base_url
            },
            transport,
        }
    }

    fn build_payload(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.context.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: request.context.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: DEFAULT_MODEL,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        if self.credential.is_empty() {
            return Err(BackendError::NotConfigured("OpenAI API key"));
        }

        let body = serde_json::to_string(&self.build_payload(request))
            .map_err(ProtocolError::Encode)?;

        let headers = vec![
            (
                "Authorization".to_string(),
                // Credential exposed only here, at the point of use.
                format!("Bearer {}", self.credential.expose()),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];

        let response = self
            .transport
            .post(&format!("{}/chat/completions", self.base_url), &body, &headers)
            .await?;

        if response.status != 200 {
            return Err(ProtocolError::Status(response.status).into());
        }

        let content = extract_string_field(&response.body, "content")?;
        Ok(GenerationResponse::ok(content))
    }

    fn is_configured(&self) -> bool {
        !self.credential.is_empty()
    }

    async fn test_connection(&self) -> bool {
        if self.credential.is_empty() {
            return false;
        }

        let probe = GenerationRequest {
            prompt: "Test".to_string(),
            max_tokens: 5,
            ..GenerationRequest::default()
        };
        self.generate(&probe).await.is_ok()
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
