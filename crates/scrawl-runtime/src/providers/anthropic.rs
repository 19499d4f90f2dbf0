//! Anthropic messages backend.
//!
//! Request shape: `{model, max_tokens, messages:[{role:"user",content}]}`
//! posted to `{base}/messages` with `x-api-key` and `anthropic-version`
//! headers. Context is folded into the user message rather than sent as a
//! separate system turn. The generated text is the first `"text"` string
//! in the response.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use scrawl_core::types::{GenerationRequest, GenerationResponse};

use super::{ApiCredential, Backend, BackendError, CredentialSource};
use crate::codec::{extract_string_field, ProtocolError};
use crate::transport::HttpTransport;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    credential: ApiCredential,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: &'static str,
    max_tokens: u32,
    messages: Vec<UserMessage>,
}

#[derive(Debug, Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

impl AnthropicBackend {
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
                "Anthropic API key",
            ),
            base_url: if base_url.is_empty() {
                DEFAULT_BASE_URL.to_string()
            } else {
                base_url
            },
            transport,
        }
    }

    fn build_payload(&self, request: &GenerationRequest) -> MessagesRequest {
        let content = if request.context.is_empty() {
            request.prompt.clone()
        } else {
            format!("{}\n\n{}", request.context, request.prompt)
        };

        MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: request.max_tokens,
            messages: vec![UserMessage {
                role: "user",
                content,
            }],
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        if self.credential.is_empty() {
            return Err(BackendError::NotConfigured("Anthropic API key"));
        }

        let body = serde_json::to_string(&self.build_payload(request))
            .map_err(ProtocolError::Encode)?;

        let headers = vec![
            (
                "x-api-key".to_string(),
                self.credential.expose().to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
        ];

        let response = self
            .transport
            .post(&format!("{}/messages", self.base_url), &body, &headers)
            .await?;

        if response.status != 200 {
            return Err(ProtocolError::Status(response.status).into());
        }

        let content = extract_string_field(&response.body, "text")?;
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
        "Anthropic"
    }
}
