//! Naive entity extraction
//!
//! Extracts candidate organization names from a free-text query without any
//! model call. The primary path tags tokens against a fixed brand lexicon and
//! a corporate-suffix heuristic; when that yields nothing, a title-case
//! heuristic stands in as a proper-noun proxy.

use super::stopwords::remove_stopwords;
use std::collections::HashSet;

/// Well-known tech/consumer brand names
///
/// Shared with the relevance filter's sender heuristic.
pub const KNOWN_ORGANIZATIONS: &[&str] = &[
    "amazon", "google", "apple", "microsoft", "meta", "facebook", "instagram",
    "netflix", "spotify", "paypal", "stripe", "uber", "lyft", "airbnb",
    "linkedin", "twitter", "github", "gitlab", "slack", "zoom", "dropbox",
    "salesforce", "shopify", "ebay", "walmart", "target", "fedex", "ups",
    "dhl", "usps", "chase", "wellsfargo", "citibank", "venmo", "coinbase",
    "doordash", "grubhub", "expedia", "booking", "delta", "united", "southwest",
];

/// Corporate suffixes used to tag tokens as organizations
const ORG_SUFFIXES: &[&str] = &["inc", "inc.", "corp", "corp.", "llc", "ltd", "ltd.", "co."];

/// Strip surrounding punctuation from a raw whitespace token
fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_ascii_punctuation())
}

/// Check whether a token reads as an organization name
fn is_organization_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    KNOWN_ORGANIZATIONS.contains(&lower.as_str())
        || ORG_SUFFIXES.contains(&lower.as_str())
}

/// Title-cased token: first letter uppercase, remainder lowercase
fn is_title_cased(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_lowercase()),
        _ => false,
    }
}

/// Extract candidate organization/proper-noun tokens from a query
///
/// Returns an empty vector when nothing qualifies; never fails for
/// well-formed string input.
pub fn extract_organizations(query: &str) -> Vec<String> {
    let tokens: Vec<&str> = query
        .split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect();

    // Primary path: organization-tagged tokens
    let mut candidates: Vec<String> = tokens
        .iter()
        .filter(|t| is_organization_token(t))
        .map(|t| t.to_string())
        .collect();

    // Fallback path: title-cased tokens as a proper-noun proxy
    if candidates.is_empty() {
        candidates = tokens
            .iter()
            .filter(|t| t.len() > 1 && is_title_cased(t))
            .map(|t| t.to_string())
            .collect();
    }

    let candidates = remove_stopwords(candidates);

    // Set semantics, first occurrence wins
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.to_lowercase()))
        .collect()
}
