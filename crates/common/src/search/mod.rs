//! Query understanding and relevance filtering
//!
//! The search pipeline resolves a free-text query into a keyword set
//! (model-backed with a deterministic fallback) plus organization candidates,
//! then filters candidate emails with sender heuristics and whole-word
//! matching. Everything here is request-scoped and free of shared mutable
//! state, so it is safe to call from concurrent fetch tasks.

pub mod entities;
pub mod extractor;
pub mod relevance;
pub mod resolver;
pub mod stopwords;

pub use entities::{extract_organizations, KNOWN_ORGANIZATIONS};
pub use extractor::{ModelExtraction, ModelKeywordExtractor};
pub use relevance::{filter_relevant, is_likely_entity, CandidateEmail, MAX_RESULTS};
pub use resolver::{fallback_keywords, ExtractionPath, KeywordResolver, QueryEntities};
pub use stopwords::{is_stopword, remove_stopwords, STOPWORDS};
