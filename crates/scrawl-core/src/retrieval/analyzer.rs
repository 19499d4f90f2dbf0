//! Lexical text analysis: normalization, tokenization, and the set-overlap
//! similarity score used by the document index.

use std::collections::HashSet;

/// Normalize text for matching: alphanumerics are lowercased, whitespace
/// runs collapse to a single space, everything else is dropped.
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());

    for c in text.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                normalized.push(lower);
            }
        } else if c.is_whitespace() {
            if !normalized.ends_with(' ') && !normalized.is_empty() {
                normalized.push(' ');
            }
        }
        // Punctuation and symbols are dropped, not treated as separators.
    }

    normalized
}

/// Split normalized text into tokens, keeping only tokens longer than two
/// characters.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Score a document against a query as the fraction of distinct query
/// tokens that appear anywhere in the document's token set.
///
/// The score is asymmetric: it is normalized by the query's token count
/// only, and term frequency is ignored. An empty query or document scores
/// zero.
pub fn similarity(query: &str, document: &str) -> f32 {
    let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
    let doc_tokens: HashSet<String> = tokenize(document).into_iter().collect();

    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0.0;
    }

    let matches = query_tokens
        .iter()
        .filter(|token| doc_tokens.contains(*token))
        .count();

    matches as f32 / query_tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_drops_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("Hello, World!!"), "hello world");
        assert_eq!(normalize("  many   spaces\there"), "many spaces here");
        assert_eq!(normalize("don't"), "dont");
    }

    #[test]
    fn test_tokenize_filters_short_tokens() {
        assert_eq!(tokenize("Hello, World!!"), vec!["hello", "world"]);
        assert_eq!(tokenize("I am at an AI talk"), vec!["talk"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_similarity_full_overlap() {
        let score = similarity("machine learning", "I love machine learning and AI");
        assert!((score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_similarity_no_overlap() {
        assert_eq!(similarity("machine learning", "I love AI"), 0.0);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        let score = similarity("machine learning models", "training machine models");
        assert!((score - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_ignores_duplicate_query_tokens() {
        let single = similarity("machine", "machine shop");
        let repeated = similarity("machine machine", "machine shop");
        assert_eq!(single, repeated);
    }

    #[test]
    fn test_similarity_empty_inputs() {
        assert_eq!(similarity("", "some document"), 0.0);
        assert_eq!(similarity("query words", ""), 0.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_output_is_clean(text in "[ -~\\t\\n]*") {
            let normalized = normalize(&text);
            prop_assert!(normalized
                .chars()
                .all(|c| c == ' ' || (c.is_alphanumeric() && !c.is_uppercase())));
            prop_assert!(!normalized.contains("  "));
            prop_assert!(!normalized.starts_with(' '));
        }

        #[test]
        fn prop_similarity_is_a_ratio(query in "[a-zA-Z ]{0,40}", doc in "[a-zA-Z ]{0,80}") {
            let score = similarity(&query, &doc);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
