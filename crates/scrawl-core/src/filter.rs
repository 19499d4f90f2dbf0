//! Content filter engine.
//!
//! Evaluates request prompts and generated output against the configured
//! content policy: a safety keyword scan, topic allow/block lists, and a
//! use-case restriction. Checks run in that order and the first failing
//! check wins.
//!
//! Matching is raw case-folded substring search with no word-boundary
//! handling: a blocked topic "violence" also matches "violence-free". This
//! mirrors the shipped behavior and is covered by tests; do not tighten it
//! without revisiting the policy semantics.

use lazy_static::lazy_static;

use crate::types::{FilterConfig, FilterLevel, GenerationRequest};

lazy_static! {
    /// Keywords scanned at the strict level.
    static ref STRICT_KEYWORDS: Vec<&'static str> = vec![
        "violence", "hate", "harassment", "illegal", "harmful",
        "dangerous", "explicit", "nsfw", "toxic",
    ];

    /// Keywords scanned at the moderate level.
    static ref MODERATE_KEYWORDS: Vec<&'static str> = vec![
        "violence", "hate", "harassment", "illegal", "dangerous",
    ];
}

/// Outcome of a single filter evaluation.
///
/// The rejection reason travels with the decision rather than being stored
/// on the engine, so concurrent evaluations cannot observe each other's
/// reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Allowed,
    Rejected(String),
}

impl FilterDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FilterDecision::Allowed)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            FilterDecision::Allowed => None,
            FilterDecision::Rejected(reason) => Some(reason),
        }
    }
}

/// Stateless-per-call policy evaluator over text and request metadata.
#[derive(Debug, Clone, Default)]
pub struct ContentFilterEngine {
    config: FilterConfig,
}

impl ContentFilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Replace the policy applied by subsequent evaluations.
    pub fn update_config(&mut self, config: FilterConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Evaluate `content` under this engine's policy, using `request`
    /// metadata for the use-case check.
    pub fn evaluate(&self, content: &str, request: &GenerationRequest) -> FilterDecision {
        if !self.check_safety(content) {
            return FilterDecision::Rejected("Content blocked by safety filter".to_string());
        }

        if !self.config.allowed_topics.is_empty() || !self.config.blocked_topics.is_empty() {
            if !self.check_topics(content) {
                return FilterDecision::Rejected("Content blocked by topic filter".to_string());
            }
        }

        if !self.check_use_case(request) {
            return FilterDecision::Rejected("Request blocked by use case filter".to_string());
        }

        FilterDecision::Allowed
    }

    /// Convenience wrapper over [`evaluate`](Self::evaluate).
    pub fn is_allowed(&self, content: &str, request: &GenerationRequest) -> bool {
        self.evaluate(content, request).is_allowed()
    }

    fn check_safety(&self, content: &str) -> bool {
        let keywords: &[&str] = match self.config.level {
            FilterLevel::Strict => &STRICT_KEYWORDS,
            FilterLevel::Moderate => &MODERATE_KEYWORDS,
            FilterLevel::Permissive => return true,
        };

        let lower = content.to_lowercase();
        !keywords.iter().any(|kw| lower.contains(kw))
    }

    fn check_topics(&self, content: &str) -> bool {
        let lower = content.to_lowercase();

        for blocked in &self.config.blocked_topics {
            if lower.contains(&blocked.to_lowercase()) {
                return false;
            }
        }

        // With an allow list present, at least one allowed topic must appear.
        if !self.config.allowed_topics.is_empty() {
            return self
                .config
                .allowed_topics
                .iter()
                .any(|allowed| lower.contains(&allowed.to_lowercase()));
        }

        true
    }

    fn check_use_case(&self, request: &GenerationRequest) -> bool {
        if self.config.allowed_use_cases.is_empty() {
            return true;
        }

        match request.metadata.get("useCase") {
            Some(use_case) => self
                .config
                .allowed_use_cases
                .iter()
                .any(|allowed| allowed == use_case),
            // Restrictions exist but the request declares no use case.
            None => false,
        }
    }
}
