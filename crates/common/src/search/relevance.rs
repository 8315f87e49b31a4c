//! Relevance filtering
//!
//! Decides which candidate emails are true positives for a keyword set using
//! two independent OR'd checks per keyword: a sender/company heuristic and a
//! case-insensitive whole-word regex over subject, from, and body. Matching is
//! deliberately ranking-free; output order is upstream fetch order, truncated
//! to a fixed cap.

use super::entities::KNOWN_ORGANIZATIONS;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of emails returned from filtering
pub const MAX_RESULTS: usize = 50;

/// Candidate email record, owned by the caller and only read here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEmail {
    /// Provider message ID
    pub id: String,

    /// Subject line
    pub subject: String,

    /// From header (display name and/or address)
    pub from: String,

    /// Plain-text body
    pub body: String,

    /// Message date; carried for display, not used in filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// Check whether a keyword looks like an entity name
///
/// True when the keyword is on the known-company allow-list or matches the
/// single-capitalized-word pattern (one uppercase letter followed by
/// lowercase letters).
pub fn is_likely_entity(keyword: &str) -> bool {
    let lower = keyword.to_lowercase();
    if KNOWN_ORGANIZATIONS.contains(&lower.as_str()) {
        return true;
    }

    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let rest: Vec<char> = chars.collect();
            !rest.is_empty() && rest.iter().all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    }
}

/// Escape regex metacharacters in a keyword
///
/// regex-lite does not ship an escape helper; backslash-escaping every
/// non-alphanumeric character is sufficient for its syntax.
fn escape_meta(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() * 2);
    for c in keyword.chars() {
        if c.is_alphanumeric() || c == '_' || c == ' ' {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }
    escaped
}

/// Build a case-insensitive whole-word matcher for a keyword
///
/// Compile failure degrades to `None` (treated as no match) rather than
/// panicking on adversarial input.
fn whole_word_regex(keyword: &str) -> Option<Regex> {
    let pattern = format!(r"(?i)\b{}\b", escape_meta(keyword));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(keyword = keyword, error = %e, "Keyword regex failed to compile");
            None
        }
    }
}

/// Check a single candidate against a single keyword
fn keyword_matches(candidate: &CandidateEmail, keyword: &str) -> bool {
    // Sender/company heuristic: entity-looking keywords match on the From
    // header as a case-insensitive substring
    if is_likely_entity(keyword)
        && candidate
            .from
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    {
        return true;
    }

    // Whole-word match against subject, from, and body
    if let Some(re) = whole_word_regex(keyword) {
        if re.is_match(&candidate.subject)
            || re.is_match(&candidate.from)
            || re.is_match(&candidate.body)
        {
            return true;
        }
    }

    false
}

/// Filter candidates down to those matching at least one keyword
///
/// Pure function: input order is preserved, the input is never mutated, and
/// the result is truncated to the first `MAX_RESULTS` survivors. An empty
/// keyword list matches nothing.
pub fn filter_relevant(candidates: &[CandidateEmail], keywords: &[String]) -> Vec<CandidateEmail> {
    if keywords.is_empty() {
        return Vec::new();
    }

    candidates
        .iter()
        .filter(|c| keywords.iter().any(|k| keyword_matches(c, k)))
        .take(MAX_RESULTS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str, subject: &str, from: &str, body: &str) -> CandidateEmail {
        CandidateEmail {
            id: id.to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
            body: body.to_string(),
            date: None,
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_is_likely_entity() {
        assert!(is_likely_entity("amazon")); // allow-list
        assert!(is_likely_entity("AMAZON")); // allow-list, case-insensitive
        assert!(is_likely_entity("Contoso")); // capitalized word
        assert!(!is_likely_entity("refund")); // lowercase, not listed
        assert!(!is_likely_entity("Q3")); // digit after capital
        assert!(!is_likely_entity("A")); // single letter
    }

    #[test]
    fn test_sender_heuristic_keeps_match() {
        // "amazon" never appears in subject or body, only in the From header
        let candidates = vec![email(
            "m1",
            "Your package has shipped",
            "shipment@amazon.com",
            "Tracking number enclosed.",
        )];

        let kept = filter_relevant(&candidates, &kw(&["amazon", "refund"]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "m1");
    }

    #[test]
    fn test_whole_word_boundary() {
        let candidates = vec![email("m1", "notes", "a@b.com", "how to concatenate strings")];
        assert!(filter_relevant(&candidates, &kw(&["cat"])).is_empty());

        let candidates = vec![email("m2", "notes", "a@b.com", "my cat is missing")];
        assert_eq!(filter_relevant(&candidates, &kw(&["cat"])).len(), 1);
    }

    #[test]
    fn test_multi_word_keyword() {
        let keywords = kw(&["Q3 report"]);

        let hit = vec![email("m1", "", "a@b.com", "as discussed, the Q3 report is attached")];
        assert_eq!(filter_relevant(&hit, &keywords).len(), 1);

        let miss = vec![email("m2", "", "a@b.com", "the Q35 report is attached")];
        assert!(filter_relevant(&miss, &keywords).is_empty());
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let keywords = kw(&["a.b*c"]);

        // Must not panic, and must not treat . or * as regex operators
        let miss = vec![email("m1", "", "x@y.com", "axbbc and aXbc here")];
        assert!(filter_relevant(&miss, &keywords).is_empty());

        let hit = vec![email("m2", "", "x@y.com", "ref a.b*c attached")];
        assert_eq!(filter_relevant(&hit, &keywords).len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let candidates = vec![email("m1", "s", "f@x.com", "b")];
        assert!(filter_relevant(&candidates, &[]).is_empty());
        assert!(filter_relevant(&[], &kw(&["anything"])).is_empty());
    }

    #[test]
    fn test_cap_and_order() {
        let candidates: Vec<CandidateEmail> = (0..60)
            .map(|i| email(&format!("m{}", i), "refund status", "x@y.com", "about your refund"))
            .collect();

        let kept = filter_relevant(&candidates, &kw(&["refund"]));
        assert_eq!(kept.len(), MAX_RESULTS);
        for (i, c) in kept.iter().enumerate() {
            assert_eq!(c.id, format!("m{}", i));
        }
    }

    #[test]
    fn test_order_preserving_subsequence() {
        let candidates = vec![
            email("m1", "refund", "a@x.com", ""),
            email("m2", "unrelated", "b@x.com", "nothing here"),
            email("m3", "your refund", "c@x.com", ""),
        ];

        let kept = filter_relevant(&candidates, &kw(&["refund"]));
        let ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn test_idempotent() {
        let candidates = vec![
            email("m1", "refund", "a@x.com", ""),
            email("m2", "invoice", "billing@stripe.com", "payment received"),
        ];
        let keywords = kw(&["refund", "stripe"]);

        let first = filter_relevant(&candidates, &keywords);
        let second = filter_relevant(&candidates, &keywords);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn test_case_insensitive_matching() {
        let candidates = vec![email("m1", "REFUND CONFIRMED", "x@y.com", "")];
        assert_eq!(filter_relevant(&candidates, &kw(&["refund"])).len(), 1);
    }
}
