//! Stopword filtering
//!
//! A fixed English stopword list extended with the generic mail-domain words
//! ("email", "message", ...) that carry no signal in an inbox search. The list
//! is a process-wide immutable constant.

/// Built-in stopword list (English + mail-domain generics)
pub const STOPWORDS: &[&str] = &[
    // Articles, conjunctions, prepositions
    "a", "an", "the", "and", "or", "but", "not", "if", "then",
    "in", "on", "at", "to", "for", "of", "with", "by", "from",
    "about", "regarding", "as", "into", "over", "under",
    // Pronouns and determiners
    "i", "me", "my", "we", "our", "you", "your", "it", "its",
    "this", "that", "these", "those", "all", "any", "some",
    // Verbs and auxiliaries
    "is", "are", "was", "were", "be", "been", "being",
    "do", "does", "did", "has", "have", "had",
    "can", "could", "will", "would", "should", "may", "might",
    "show", "find", "search", "get", "give", "want", "need", "please",
    // Mail-domain generics
    "email", "emails", "mail", "mails", "message", "messages",
    "inbox", "sent", "received", "account", "update", "updates",
];

/// Check whether a token is a stopword (case-insensitive)
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.iter().any(|s| s.eq_ignore_ascii_case(token))
}

/// Drop stopwords from a token list
///
/// Preserves the relative order of survivors and performs no deduplication;
/// callers deduplicate separately.
pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().filter(|t| !is_stopword(t)).collect()
}
