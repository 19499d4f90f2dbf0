//! Core data model shared between the deterministic engine and the runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The kinds of AI backend the assistant can dispatch to.
///
/// Four built-in kinds plus one slot for a caller-supplied implementation.
/// Note that `Gemini` is a recognized kind with no built-in wire
/// implementation; it only ever appears in a registry if supplied as a
/// custom backend under its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
    Custom,
}

impl BackendKind {
    /// All built-in kinds, in registry initialization order.
    pub const BUILT_IN: [BackendKind; 4] = [
        BackendKind::OpenAi,
        BackendKind::Anthropic,
        BackendKind::Gemini,
        BackendKind::Ollama,
    ];

    /// The short name used in configuration keys and persisted settings.
    pub fn config_name(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Anthropic => "anthropic",
            BackendKind::Gemini => "google",
            BackendKind::Ollama => "ollama",
            BackendKind::Custom => "custom",
        }
    }

    /// Parse a persisted backend name. Unknown names map to `OpenAi`,
    /// matching the default the original settings loader fell back to.
    pub fn from_config_name(name: &str) -> BackendKind {
        match name {
            "anthropic" => BackendKind::Anthropic,
            "google" => BackendKind::Gemini,
            "ollama" => BackendKind::Ollama,
            "custom" => BackendKind::Custom,
            _ => BackendKind::OpenAi,
        }
    }
}

/// Strictness tier of the safety keyword scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Strict,
    #[default]
    Moderate,
    Permissive,
}

impl FilterLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterLevel::Strict => "strict",
            FilterLevel::Moderate => "moderate",
            FilterLevel::Permissive => "permissive",
        }
    }

    /// Parse a persisted level name; anything unrecognized is `Moderate`.
    pub fn from_str_lossy(s: &str) -> FilterLevel {
        match s {
            "strict" => FilterLevel::Strict,
            "permissive" => FilterLevel::Permissive,
            _ => FilterLevel::Moderate,
        }
    }
}

/// Content policy applied before and after generation.
///
/// Topic lists match case-insensitively as raw substrings; use cases match
/// exactly (case-sensitive) against the request's `useCase` metadata entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub allowed_topics: Vec<String>,
    pub blocked_topics: Vec<String>,
    pub allowed_use_cases: Vec<String>,
    pub level: FilterLevel,
    /// Persisted alongside the level. The pipeline filters retrieved
    /// context the same way regardless; the flag is carried for the
    /// settings surface only.
    pub rag_filtering: bool,
}

impl FilterConfig {
    /// The configuration the assistant starts with: moderate safety
    /// scanning, no topic or use-case restrictions.
    pub fn moderate() -> Self {
        Self {
            rag_filtering: true,
            ..Self::default()
        }
    }
}

/// A generation request as handed to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user prompt.
    pub prompt: String,
    /// Optional context sent ahead of the prompt. Replaced by retrieved
    /// context when `documents` is non-empty and a retriever is attached.
    pub context: String,
    /// Attached document texts. Only their presence matters: a non-empty
    /// list triggers retrieval augmentation.
    pub documents: Vec<String>,
    /// Free-form request metadata. The `useCase` key participates in
    /// use-case filtering.
    pub metadata: HashMap<String, String>,
    /// Content policy for this request.
    pub filter: FilterConfig,
    /// Backend selector recorded on the request. Dispatch always goes to
    /// the currently active backend; this records intent only.
    pub backend: BackendKind,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            context: String::new(),
            documents: Vec::new(),
            metadata: HashMap::new(),
            filter: FilterConfig::moderate(),
            backend: BackendKind::OpenAi,
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl GenerationRequest {
    /// Create a request for a bare prompt with default settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the `useCase` metadata entry.
    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.metadata
            .insert("useCase".to_string(), use_case.into());
        self
    }
}

/// The result of a generation request.
///
/// A response is either a success carrying non-empty content, or a failure
/// with empty content and an error and/or a filter rejection reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub content: String,
    pub success: bool,
    pub error: String,
    /// Set only when a content filter rejected the request or the
    /// generated output.
    pub filtered_reason: String,
    pub metadata: HashMap<String, String>,
    pub confidence: f32,
}

impl GenerationResponse {
    /// A successful response with the given content.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
            ..Self::default()
        }
    }

    /// A failure response with the given error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    /// A failure response for a filter rejection.
    pub fn rejected(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            filtered_reason: reason.into(),
            ..Self::default()
        }
    }
}

/// A document held by the retrieval index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique key within an index; indexing an existing id replaces the
    /// stored document (upsert).
    pub id: String,
    pub content: String,
    pub title: String,
    /// Where the document came from, e.g. "user_document".
    pub source: String,
    pub tags: Vec<String>,
    /// Populated on search results only; never persisted.
    pub relevance: f32,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}
