//! Model-backed keyword extraction
//!
//! Sends the query to the chat model with a constrained prompt asking for a
//! comma-separated list of high-signal keywords, then parses and cleans the
//! reply. All transport and parse failures are absorbed here: the caller sees
//! a tagged outcome, never an error.

use super::stopwords::remove_stopwords;
use crate::llm::ChatModel;
use crate::metrics::record_model_call;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// System instruction reinforcing the output constraint
const SYSTEM_PROMPT: &str = "You extract search keywords from email search queries. \
Respond with a comma-separated list of keywords only, no explanations.";

/// Outcome of a model extraction attempt
///
/// `Empty` (a successful call that produced nothing salient) is deliberately
/// distinct from `Unavailable` (transport or parse failure); both trigger the
/// deterministic fallback, but they are different facts worth telling apart.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelExtraction {
    /// At least one keyword survived parsing and stopword removal
    Keywords(Vec<String>),
    /// The call succeeded but no usable keyword came back
    Empty,
    /// The model could not be reached or its reply could not be read
    Unavailable,
}

/// Keyword extractor backed by a chat model
pub struct ModelKeywordExtractor {
    model: Arc<dyn ChatModel>,
}

impl ModelKeywordExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Build the constrained extraction prompt for a query
    fn build_prompt(query: &str) -> String {
        format!(
            "Extract the unique, high-signal keywords from this email search query. \
            Include organization names, product names, people, and identifiers. \
            Exclude generic words such as \"account\", \"email\", \"message\", \"update\". \
            Reply with a comma-separated list only.\n\nQuery: {}",
            query
        )
    }

    /// Parse a raw model reply into keywords
    ///
    /// Best-effort split-and-trim; stopwords are dropped and duplicates
    /// collapsed (first occurrence wins, case-insensitive).
    fn parse_reply(reply: &str) -> Vec<String> {
        let tokens: Vec<String> = reply
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let tokens = remove_stopwords(tokens);

        let mut seen = HashSet::new();
        tokens
            .into_iter()
            .filter(|t| seen.insert(t.to_lowercase()))
            .collect()
    }

    /// Extract keywords for a query
    ///
    /// Never propagates an error; failures become `ModelExtraction::Unavailable`.
    pub async fn extract(&self, query: &str) -> ModelExtraction {
        let prompt = Self::build_prompt(query);
        let start = Instant::now();

        let outcome = self.model.complete(SYSTEM_PROMPT, &prompt).await;
        record_model_call(
            start.elapsed().as_secs_f64(),
            self.model.model_name(),
            outcome.is_ok(),
        );

        match outcome {
            Ok(reply) => {
                let keywords = Self::parse_reply(&reply);
                if keywords.is_empty() {
                    ModelExtraction::Empty
                } else {
                    ModelExtraction::Keywords(keywords)
                }
            }
            Err(e) => {
                tracing::warn!(
                    model = self.model.model_name(),
                    error = %e,
                    "Model keyword extraction failed, falling back"
                );
                ModelExtraction::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatModel;

    #[tokio::test]
    async fn test_successful_extraction() {
        let extractor = ModelKeywordExtractor::new(Arc::new(MockChatModel::new(
            "Amazon, refund, order 112-884",
        )));

        let outcome = extractor.extract("emails from Amazon about my refund").await;
        assert_eq!(
            outcome,
            ModelExtraction::Keywords(vec![
                "Amazon".to_string(),
                "refund".to_string(),
                "order 112-884".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let extractor = ModelKeywordExtractor::new(Arc::new(MockChatModel::failing()));
        let outcome = extractor.extract("any query").await;
        assert_eq!(outcome, ModelExtraction::Unavailable);
    }

    #[tokio::test]
    async fn test_blank_reply_is_empty() {
        let extractor = ModelKeywordExtractor::new(Arc::new(MockChatModel::new("  , , ")));
        let outcome = extractor.extract("any query").await;
        assert_eq!(outcome, ModelExtraction::Empty);
    }

    #[tokio::test]
    async fn test_all_stopwords_reply_is_empty() {
        let extractor = ModelKeywordExtractor::new(Arc::new(MockChatModel::new("the, email, from")));
        let outcome = extractor.extract("any query").await;
        assert_eq!(outcome, ModelExtraction::Empty);
    }

    #[test]
    fn test_parse_trims_and_dedupes() {
        let keywords = ModelKeywordExtractor::parse_reply(" Amazon ,refund, AMAZON ,, refund ");
        assert_eq!(keywords, vec!["Amazon".to_string(), "refund".to_string()]);
    }
}
