//! Keyword resolution facade
//!
//! The public entry point for query understanding: prefers the model-backed
//! extractor for semantic precision, and degrades to a deterministic
//! stopword/regex-free fallback so search never blocks on the model.

use super::entities::extract_organizations;
use super::extractor::{ModelExtraction, ModelKeywordExtractor};
use super::stopwords::remove_stopwords;
use crate::llm::ChatModel;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Resolved query entities
#[derive(Debug, Clone, Serialize)]
pub struct QueryEntities {
    /// Organization candidates from the naive extractor
    pub organizations: Vec<String>,

    /// Final keyword set
    pub keywords: Vec<String>,
}

/// Which extraction path produced the final keyword set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Model,
    Fallback,
}

impl ExtractionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPath::Model => "model",
            ExtractionPath::Fallback => "fallback",
        }
    }
}

/// Facade over the model extractor and the deterministic fallback
pub struct KeywordResolver {
    extractor: ModelKeywordExtractor,
}

impl KeywordResolver {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            extractor: ModelKeywordExtractor::new(model),
        }
    }

    /// Resolve the final keyword set for a query
    ///
    /// The model result is returned as-is when it has at least one element;
    /// otherwise the deterministic fallback runs. The two are never merged.
    pub async fn resolve_keywords(&self, query: &str) -> (Vec<String>, ExtractionPath) {
        match self.extractor.extract(query).await {
            ModelExtraction::Keywords(keywords) => (keywords, ExtractionPath::Model),
            ModelExtraction::Empty | ModelExtraction::Unavailable => {
                (fallback_keywords(query), ExtractionPath::Fallback)
            }
        }
    }

    /// Resolve organizations and keywords independently
    ///
    /// The two lists are never cross-filtered against each other.
    pub async fn resolve_entities(&self, query: &str) -> (QueryEntities, ExtractionPath) {
        let organizations = extract_organizations(query);
        let (keywords, path) = self.resolve_keywords(query).await;

        (
            QueryEntities {
                organizations,
                keywords,
            },
            path,
        )
    }
}

/// Deterministic fallback extraction
///
/// Lowercase, strip `? . , !`, split on whitespace runs, drop empties,
/// remove stopwords, deduplicate. May return an empty vector.
pub fn fallback_keywords(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '?' | '.' | ',' | '!'))
        .collect();

    let tokens: Vec<String> = cleaned
        .split_whitespace()
        .map(str::to_string)
        .filter(|t| !t.is_empty())
        .collect();

    let tokens = remove_stopwords(tokens);

    let mut seen = HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatModel;

    #[test]
    fn test_fallback_scenario() {
        // Stopwords "emails", "from", "about", "my" are removed
        let keywords = fallback_keywords("emails from Amazon about my refund");
        assert_eq!(keywords, vec!["amazon".to_string(), "refund".to_string()]);
    }

    #[test]
    fn test_fallback_strips_punctuation_and_dedupes() {
        let keywords = fallback_keywords("Refund? refund! from amazon.com,");
        assert_eq!(keywords, vec!["refund".to_string(), "amazoncom".to_string()]);
    }

    #[test]
    fn test_fallback_may_be_empty() {
        assert!(fallback_keywords("show me all my emails").is_empty());
    }

    #[tokio::test]
    async fn test_model_result_returned_as_is() {
        let resolver = KeywordResolver::new(Arc::new(MockChatModel::new("Amazon, refund")));
        let (keywords, path) = resolver.resolve_keywords("emails from Amazon").await;

        assert_eq!(path, ExtractionPath::Model);
        // Case-preserving, no merge with the fallback's lowercased tokens
        assert_eq!(keywords, vec!["Amazon".to_string(), "refund".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_model_triggers_fallback() {
        let resolver = KeywordResolver::new(Arc::new(MockChatModel::failing()));
        let query = "emails from Amazon about my refund";

        let (keywords, path) = resolver.resolve_keywords(query).await;
        assert_eq!(path, ExtractionPath::Fallback);
        // Byte-for-byte equal to the deterministic fallback
        assert_eq!(keywords, fallback_keywords(query));
    }

    #[tokio::test]
    async fn test_empty_model_result_triggers_fallback() {
        // A successful call whose reply dissolves into nothing
        let resolver = KeywordResolver::new(Arc::new(MockChatModel::new("the, email")));
        let query = "refund from Amazon";

        let (keywords, path) = resolver.resolve_keywords(query).await;
        assert_eq!(path, ExtractionPath::Fallback);
        assert_eq!(keywords, fallback_keywords(query));
    }

    #[tokio::test]
    async fn test_entities_resolved_independently() {
        let resolver = KeywordResolver::new(Arc::new(MockChatModel::new("refund")));
        let (entities, _) = resolver.resolve_entities("emails from Amazon about my refund").await;

        // Organizations come from the naive extractor, keywords from the model;
        // "Amazon" is absent from keywords yet present in organizations.
        assert_eq!(entities.organizations, vec!["Amazon".to_string()]);
        assert_eq!(entities.keywords, vec!["refund".to_string()]);
    }
}
