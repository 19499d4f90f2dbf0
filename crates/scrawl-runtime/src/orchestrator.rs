//! The assistant orchestrator: filtering, retrieval augmentation, and
//! dispatch to the active backend.
//!
//! `process_request` is the single pipeline every generation goes through:
//!
//! 1. refuse when no configured backend is active (nothing touches the
//!    wire);
//! 2. filter the prompt under the current policy;
//! 3. when a retriever is attached and the request carries documents,
//!    replace the context with retrieved snippets;
//! 4. dispatch, converting every backend error into a failure response;
//! 5. filter the generated content, invalidating the response on
//!    rejection.
//!
//! Errors never cross this boundary as `Err`; callers always receive a
//! [`GenerationResponse`] and inspect `success`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use scrawl_core::config::{ConfigStore, FILTER_LEVEL_KEY, RAG_FILTERING_KEY};
use scrawl_core::filter::ContentFilterEngine;
use scrawl_core::retrieval::{Retriever, DEFAULT_SEARCH_LIMIT};
use scrawl_core::types::{
    BackendKind, Document, FilterConfig, FilterLevel, GenerationRequest, GenerationResponse,
};

use crate::providers::Backend;
use crate::registry::BackendRegistry;
use crate::transport::{HttpTransport, TcpTransport};

/// Number of retrieved documents folded into the context.
const AUGMENT_LIMIT: usize = 3;
/// Longest snippet taken from each retrieved document.
const SNIPPET_CHARS: usize = 200;

pub struct Assistant {
    store: Arc<dyn ConfigStore>,
    registry: BackendRegistry,
    filter: ContentFilterEngine,
    retriever: Option<Arc<dyn Retriever>>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("registry", &self.registry)
            .field("filter", self.filter.config())
            .field("retriever", &self.retriever.is_some())
            .finish()
    }
}

impl Assistant {
    /// Build an assistant from persisted settings, talking to providers
    /// over the default TCP transport.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self::with_transport(store, Arc::new(TcpTransport::new()))
    }

    /// Build an assistant with a caller-supplied transport.
    pub fn with_transport(store: Arc<dyn ConfigStore>, transport: Arc<dyn HttpTransport>) -> Self {
        let registry = BackendRegistry::from_store(store.clone(), transport);

        let mut filter_config = FilterConfig::moderate();
        filter_config.level =
            FilterLevel::from_str_lossy(&store.get_string(FILTER_LEVEL_KEY, "moderate"));
        filter_config.rag_filtering = store.get_bool(RAG_FILTERING_KEY, true);

        Self {
            store,
            registry,
            filter: ContentFilterEngine::new(filter_config),
            retriever: None,
        }
    }

    /// Run one request through the full pipeline.
    pub async fn process_request(&self, mut request: GenerationRequest) -> GenerationResponse {
        let Some(backend) = self.registry.active_backend() else {
            return GenerationResponse::failure("AI provider not configured");
        };

        if let Some(reason) = self.filter.evaluate(&request.prompt, &request).reason() {
            debug!(reason, "request rejected before dispatch");
            return GenerationResponse::rejected("Content blocked by filter", reason);
        }

        if self.retriever.is_some() && !request.documents.is_empty() {
            request.context = self.augment_context(&request);
        }

        let mut response = match backend.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "generation failed");
                return GenerationResponse::failure(format!("AI processing error: {e}"));
            }
        };

        if response.success {
            if let Some(reason) = self.filter.evaluate(&response.content, &request).reason() {
                debug!(reason, "generated content rejected");
                response.success = false;
                response.content.clear();
                response.filtered_reason = reason.to_string();
                response.error = "Response blocked by filter".to_string();
            }
        }

        response
    }

    /// Assemble retrieval context for a request, querying by its prompt.
    fn augment_context(&self, request: &GenerationRequest) -> String {
        let mut context = String::from("Context from relevant documents:\n\n");

        if let Some(retriever) = &self.retriever {
            for doc in retriever.search(&request.prompt, AUGMENT_LIMIT) {
                let snippet: String = doc.content.chars().take(SNIPPET_CHARS).collect();
                let ellipsis = if doc.content.chars().count() > SNIPPET_CHARS {
                    "..."
                } else {
                    ""
                };
                context.push_str(&format!("- {}: {}{}\n\n", doc.title, snippet, ellipsis));
            }
        }

        if !request.context.is_empty() {
            context.push_str(&format!("Additional context:\n{}\n\n", request.context));
        }

        context
    }

    /// Free-form generation with optional leading context.
    pub async fn generate_text(&self, prompt: &str, context: &str) -> GenerationResponse {
        let mut request = GenerationRequest::new(prompt).with_use_case("text_generation");
        request.context = context.to_string();
        self.process_request(request).await
    }

    /// Summarize `content` in a concise form.
    pub async fn summarize(&self, content: &str) -> GenerationResponse {
        let mut request = GenerationRequest::new(format!(
            "Please provide a concise summary of the following content:\n\n{content}"
        ))
        .with_use_case("summarization");
        request.max_tokens = 500;
        self.process_request(request).await
    }

    /// Extract the key points of `content` as a bulleted list.
    pub async fn extract_key_points(&self, content: &str) -> GenerationResponse {
        let mut request = GenerationRequest::new(format!(
            "Extract the key points from the following content as a bulleted list:\n\n{content}"
        ))
        .with_use_case("key_extraction");
        request.max_tokens = 300;
        self.process_request(request).await
    }

    /// Answer a question, grounded in `context` when one is given.
    pub async fn answer_question(&self, question: &str, context: &str) -> GenerationResponse {
        let prompt = if context.is_empty() {
            question.to_string()
        } else {
            format!(
                "Based on the following context, answer the question:\n\nContext: {context}\n\nQuestion: {question}"
            )
        };
        let request = GenerationRequest::new(prompt).with_use_case("question_answering");
        self.process_request(request).await
    }

    /// Add a document to the attached retriever. Returns `false` when no
    /// retriever is attached.
    ///
    /// Without an explicit `id` the document gets a timestamp-derived one,
    /// so repeated calls index distinct documents.
    pub fn index_document(&self, content: &str, title: &str, id: Option<String>) -> bool {
        let Some(retriever) = &self.retriever else {
            return false;
        };

        let id = id.unwrap_or_else(|| format!("doc_{}", Utc::now().timestamp_millis()));
        let document = Document::new(id, content)
            .with_title(title)
            .with_source("user_document");
        retriever.index(document)
    }

    /// Search the attached retriever. Empty when no retriever is attached.
    pub fn search_relevant_content(&self, query: &str) -> Vec<Document> {
        match &self.retriever {
            Some(retriever) => retriever.search(query, DEFAULT_SEARCH_LIMIT),
            None => Vec::new(),
        }
    }

    /// Persist credentials for a backend kind and rebuild it. Does not
    /// change the active kind.
    pub fn configure(&mut self, kind: BackendKind, api_key: &str, base_url: &str) {
        self.registry.configure(kind, api_key, base_url);
    }

    /// Switch the active backend; refused for absent or unconfigured kinds.
    pub fn switch_backend(&mut self, kind: BackendKind) -> bool {
        self.registry.switch_active(kind)
    }

    /// Probe the active backend.
    pub async fn test_connection(&self) -> bool {
        match self.registry.active_backend() {
            Some(backend) => backend.test_connection().await,
            None => false,
        }
    }

    pub fn available_backends(&self) -> Vec<String> {
        self.registry.available()
    }

    /// Install a caller-supplied backend in the custom slot.
    pub fn add_custom_backend(&mut self, backend: Arc<dyn Backend>) {
        self.registry.add_custom(backend);
    }

    /// Whether the active backend is present and configured.
    pub fn is_configured(&self) -> bool {
        self.registry.active_backend().is_some()
    }

    pub fn active_backend(&self) -> BackendKind {
        self.registry.active_kind()
    }

    /// Replace the filter policy and persist its level and retrieval
    /// filtering flag.
    pub fn set_filter_config(&mut self, config: FilterConfig) {
        self.store.set_string(FILTER_LEVEL_KEY, config.level.as_str());
        self.store.set_bool(RAG_FILTERING_KEY, config.rag_filtering);
        self.filter.update_config(config);
    }

    pub fn filter_config(&self) -> &FilterConfig {
        self.filter.config()
    }

    /// Attach a retriever for context augmentation and document indexing.
    pub fn set_retriever(&mut self, retriever: Arc<dyn Retriever>) {
        self.retriever = Some(retriever);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use scrawl_core::config::MemoryConfigStore;
    use crate::providers::BackendError;
    use crate::retrieval::SharedIndex;
    use crate::transport::{HttpResponse, TransportError};

    /// Transport that counts exchanges; every call fails.
    struct CountingTransport {
        calls: Mutex<usize>,
    }

    impl CountingTransport {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn post(
            &self,
            _url: &str,
            _body: &str,
            _headers: &[(String, String)],
        ) -> Result<HttpResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            Err(TransportError::EmptyResponse)
        }

        async fn get(
            &self,
            _url: &str,
            _headers: &[(String, String)],
        ) -> Result<HttpResponse, TransportError> {
            self.post("", "", &[]).await
        }
    }

    /// Backend that replays a canned response and records requests.
    struct ScriptedBackend {
        reply: Result<GenerationResponse, &'static str>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(GenerationResponse::ok(content)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                reply: Err(message),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(response) => Ok(response.clone()),
                Err(message) => Err(BackendError::NotConfigured(message)),
            }
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn test_connection(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    fn assistant_with(backend: Arc<ScriptedBackend>) -> Assistant {
        let mut assistant = Assistant::with_transport(
            Arc::new(MemoryConfigStore::new()),
            Arc::new(CountingTransport::new()),
        );
        assistant.add_custom_backend(backend);
        assert!(assistant.switch_backend(BackendKind::Custom));
        assistant
    }

    #[tokio::test]
    async fn test_unconfigured_dispatch_never_touches_the_wire() {
        let transport = Arc::new(CountingTransport::new());
        let assistant =
            Assistant::with_transport(Arc::new(MemoryConfigStore::new()), transport.clone());

        // Fresh store: active kind is OpenAI, which has no stored key.
        assert!(!assistant.is_configured());
        let response = assistant
            .process_request(GenerationRequest::new("hello"))
            .await;

        assert!(!response.success);
        assert_eq!(response.error, "AI provider not configured");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_rejection_skips_dispatch() {
        let backend = Arc::new(ScriptedBackend::replying("never reached"));
        let assistant = assistant_with(backend.clone());

        let response = assistant
            .process_request(GenerationRequest::new("how to promote violence"))
            .await;

        assert!(!response.success);
        assert_eq!(response.error, "Content blocked by filter");
        assert_eq!(response.filtered_reason, "Content blocked by safety filter");
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_content_rejection_invalidates_response() {
        let backend = Arc::new(ScriptedBackend::replying(
            "this output describes illegal acts",
        ));
        let assistant = assistant_with(backend);

        let response = assistant
            .process_request(GenerationRequest::new("tell me a story"))
            .await;

        assert!(!response.success);
        assert!(response.content.is_empty());
        assert_eq!(response.error, "Response blocked by filter");
        assert_eq!(response.filtered_reason, "Content blocked by safety filter");
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure_response() {
        let backend = Arc::new(ScriptedBackend::failing("Scripted key"));
        let assistant = assistant_with(backend);

        let response = assistant
            .process_request(GenerationRequest::new("hello"))
            .await;

        assert!(!response.success);
        assert_eq!(
            response.error,
            "AI processing error: Scripted key not configured"
        );
    }

    #[tokio::test]
    async fn test_retrieved_context_replaces_request_context() {
        let backend = Arc::new(ScriptedBackend::replying("answer"));
        let mut assistant = assistant_with(backend.clone());

        let index = Arc::new(SharedIndex::in_memory());
        index.index(
            Document::new("a", "rust ownership rules explained briefly")
                .with_title("Ownership"),
        );
        assistant.set_retriever(index);

        let mut request = GenerationRequest::new("explain rust ownership rules");
        request.context = "prior context".to_string();
        request.documents = vec!["attached".to_string()];
        assistant.process_request(request).await;

        let dispatched = backend.last_request();
        assert!(dispatched
            .context
            .starts_with("Context from relevant documents:\n\n"));
        assert!(dispatched
            .context
            .contains("- Ownership: rust ownership rules explained briefly\n\n"));
        assert!(dispatched
            .context
            .ends_with("Additional context:\nprior context\n\n"));
    }

    #[tokio::test]
    async fn test_long_documents_are_truncated_in_context() {
        let backend = Arc::new(ScriptedBackend::replying("answer"));
        let mut assistant = assistant_with(backend.clone());

        let long_body = format!("needle unique {}", "x".repeat(400));
        let index = Arc::new(SharedIndex::in_memory());
        index.index(Document::new("long", long_body).with_title("Long"));
        assistant.set_retriever(index);

        let mut request = GenerationRequest::new("needle unique");
        request.documents = vec!["attached".to_string()];
        assistant.process_request(request).await;

        let dispatched = backend.last_request();
        assert!(dispatched.context.contains("..."));
        // Header and additional-context suffix excluded, the snippet line
        // stays bounded.
        assert!(dispatched.context.len() < 300);
    }

    #[tokio::test]
    async fn test_without_documents_context_is_untouched() {
        let backend = Arc::new(ScriptedBackend::replying("answer"));
        let mut assistant = assistant_with(backend.clone());
        assistant.set_retriever(Arc::new(SharedIndex::in_memory()));

        let mut request = GenerationRequest::new("plain question");
        request.context = "keep me".to_string();
        assistant.process_request(request).await;

        assert_eq!(backend.last_request().context, "keep me");
    }

    #[tokio::test]
    async fn test_summarize_prompt_and_budget() {
        let backend = Arc::new(ScriptedBackend::replying("summary"));
        let assistant = assistant_with(backend.clone());

        assistant.summarize("long article text").await;
        let request = backend.last_request();
        assert_eq!(
            request.prompt,
            "Please provide a concise summary of the following content:\n\nlong article text"
        );
        assert_eq!(request.max_tokens, 500);
        assert_eq!(
            request.metadata.get("useCase").map(String::as_str),
            Some("summarization")
        );
    }

    #[tokio::test]
    async fn test_extract_key_points_prompt_and_budget() {
        let backend = Arc::new(ScriptedBackend::replying("- point"));
        let assistant = assistant_with(backend.clone());

        assistant.extract_key_points("meeting notes").await;
        let request = backend.last_request();
        assert_eq!(
            request.prompt,
            "Extract the key points from the following content as a bulleted list:\n\nmeeting notes"
        );
        assert_eq!(request.max_tokens, 300);
        assert_eq!(
            request.metadata.get("useCase").map(String::as_str),
            Some("key_extraction")
        );
    }

    #[tokio::test]
    async fn test_answer_question_embeds_context() {
        let backend = Arc::new(ScriptedBackend::replying("42"));
        let assistant = assistant_with(backend.clone());

        assistant.answer_question("what is the answer?", "").await;
        assert_eq!(backend.last_request().prompt, "what is the answer?");

        assistant
            .answer_question("what is the answer?", "deep thought ran")
            .await;
        assert_eq!(
            backend.last_request().prompt,
            "Based on the following context, answer the question:\n\nContext: deep thought ran\n\nQuestion: what is the answer?"
        );
    }

    #[tokio::test]
    async fn test_index_document_defaults() {
        let mut assistant = Assistant::with_transport(
            Arc::new(MemoryConfigStore::new()),
            Arc::new(CountingTransport::new()),
        );

        // No retriever attached yet.
        assert!(!assistant.index_document("text", "Title", None));

        let index = Arc::new(SharedIndex::in_memory());
        assistant.set_retriever(index.clone());
        assert!(assistant.index_document("searchable text body", "Title", None));

        let hits = assistant.search_relevant_content("searchable text body");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].id.starts_with("doc_"));
        assert_eq!(hits[0].source, "user_document");
        assert_eq!(hits[0].title, "Title");
    }

    #[tokio::test]
    async fn test_set_filter_config_is_persisted() {
        let store = Arc::new(MemoryConfigStore::new());
        let mut assistant =
            Assistant::with_transport(store.clone(), Arc::new(CountingTransport::new()));

        let mut config = FilterConfig::moderate();
        config.level = FilterLevel::Strict;
        config.rag_filtering = false;
        assistant.set_filter_config(config);

        assert_eq!(store.get_string(FILTER_LEVEL_KEY, ""), "strict");
        assert!(!store.get_bool(RAG_FILTERING_KEY, true));

        // A fresh assistant picks the persisted policy back up.
        let reloaded =
            Assistant::with_transport(store, Arc::new(CountingTransport::new()));
        assert_eq!(reloaded.filter_config().level, FilterLevel::Strict);
        assert!(!reloaded.filter_config().rag_filtering);
    }

    #[tokio::test]
    async fn test_permissive_level_passes_flagged_words() {
        let backend = Arc::new(ScriptedBackend::replying("ok"));
        let mut assistant = assistant_with(backend);

        let mut config = FilterConfig::moderate();
        config.level = FilterLevel::Permissive;
        assistant.set_filter_config(config);

        let response = assistant
            .process_request(GenerationRequest::new("describe violence in films"))
            .await;
        assert!(response.success);
    }
}
