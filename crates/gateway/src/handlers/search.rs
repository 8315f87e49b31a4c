//! Email search handler
//!
//! The orchestrator for the search pipeline: resolve keywords and
//! organization candidates, build the provider query, fetch candidate
//! messages, filter for relevance, and echo the keywords that drove the
//! match back to the caller.

use axum::{extract::State, Json};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use mailsift_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    metrics,
    search::{filter_relevant, CandidateEmail, QueryEntities},
};

/// Search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 500))]
    pub query: String,
}

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    /// Emails that passed the relevance filter, in fetch order
    pub emails: Vec<CandidateEmail>,

    /// Keywords that drove the match, echoed back for display
    pub keywords: Vec<String>,

    pub processing_time_ms: u64,
}

/// Build the mail provider query string from resolved entities
///
/// Organization candidates become `from:` clauses; keywords are embedded
/// directly, quoted when multi-word. Clauses are OR-joined so the provider
/// returns a wide candidate set for the relevance filter to narrow.
pub fn build_provider_query(entities: &QueryEntities) -> String {
    let mut clauses = Vec::with_capacity(entities.organizations.len() + entities.keywords.len());

    for org in &entities.organizations {
        clauses.push(format!("from:{}", org));
    }

    for keyword in &entities.keywords {
        if keyword.contains(char::is_whitespace) {
            clauses.push(format!("\"{}\"", keyword));
        } else {
            clauses.push(keyword.clone());
        }
    }

    clauses.join(" OR ")
}

/// Perform an email search
pub async fn search(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let query = request.query.trim();
    let min_len = state.config.search.min_query_len;
    if query.chars().count() < min_len {
        return Err(AppError::QueryTooShort { min_len });
    }

    // Phase 1: Query understanding
    let (entities, path) = state.resolver.resolve_entities(query).await;
    if entities.keywords.is_empty() {
        return Err(AppError::NoKeywordsExtracted);
    }

    // Phase 2: Candidate retrieval
    let provider_query = build_provider_query(&entities);
    let ids = state
        .mail
        .list_message_ids(&auth.access_token, &provider_query, state.config.mail.max_candidates)
        .await?;

    // Fetch bodies concurrently; `buffered` keeps provider listing order.
    // Failed fetches are dropped, not escalated.
    let candidates: Vec<CandidateEmail> = stream::iter(ids)
        .map(|id| {
            let mail = state.mail.clone();
            let token = auth.access_token.clone();
            async move {
                let result = mail.fetch_message(&token, &id).await;
                metrics::record_mail_fetch(result.is_ok());
                if let Err(ref e) = result {
                    tracing::warn!(message_id = %id, error = %e, "Dropping candidate after fetch failure");
                }
                result.ok()
            }
        })
        .buffered(state.config.mail.fetch_concurrency)
        .filter_map(|c| async move { c })
        .collect()
        .await;

    // Phase 3: Relevance filtering
    let emails = filter_relevant(&candidates, &entities.keywords);

    let processing_time_ms = start.elapsed().as_millis() as u64;

    metrics::record_search(
        processing_time_ms as f64 / 1000.0,
        path.as_str(),
        emails.len(),
    );

    tracing::info!(
        query = %query,
        extraction_path = path.as_str(),
        keywords = entities.keywords.len(),
        candidates = candidates.len(),
        results = emails.len(),
        latency_ms = processing_time_ms,
        request_id = %auth.request_id,
        "Email search completed"
    );

    Ok(Json(SearchResponse {
        emails,
        keywords: entities.keywords,
        processing_time_ms,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MockMailProvider;
    use mailsift_common::{config::AppConfig, llm::MockChatModel, KeywordResolver};
    use std::sync::Arc;

    fn entities(orgs: &[&str], keywords: &[&str]) -> QueryEntities {
        QueryEntities {
            organizations: orgs.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn email(id: &str, subject: &str, from: &str, body: &str) -> CandidateEmail {
        CandidateEmail {
            id: id.to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
            body: body.to_string(),
            date: None,
        }
    }

    fn state_with(model_reply: Option<&str>, mail: MockMailProvider) -> AppState {
        let model: Arc<dyn mailsift_common::ChatModel> = match model_reply {
            Some(reply) => Arc::new(MockChatModel::new(reply)),
            None => Arc::new(MockChatModel::failing()),
        };
        AppState {
            config: Arc::new(AppConfig::default()),
            resolver: Arc::new(KeywordResolver::new(model.clone())),
            chat: model,
            mail: Arc::new(mail),
        }
    }

    fn authed() -> AuthContext {
        AuthContext {
            access_token: "ya29.test".to_string(),
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn test_build_provider_query_quotes_multiword() {
        let q = build_provider_query(&entities(&["Amazon"], &["refund", "Q3 report"]));
        assert_eq!(q, "from:Amazon OR refund OR \"Q3 report\"");
    }

    #[test]
    fn test_build_provider_query_empty() {
        assert_eq!(build_provider_query(&entities(&[], &[])), "");
    }

    #[tokio::test]
    async fn test_short_query_rejected() {
        let state = state_with(Some("refund"), MockMailProvider {
            messages: vec![],
            failing_ids: vec![],
        });

        let result = search(
            State(state),
            authed(),
            Json(SearchRequest { query: "hi".to_string() }),
        )
        .await;

        assert!(matches!(result, Err(AppError::QueryTooShort { .. })));
    }

    #[tokio::test]
    async fn test_zero_keywords_rejected() {
        // Model is down and every query token is a stopword
        let state = state_with(None, MockMailProvider {
            messages: vec![],
            failing_ids: vec![],
        });

        let result = search(
            State(state),
            authed(),
            Json(SearchRequest { query: "show me all my emails".to_string() }),
        )
        .await;

        assert!(matches!(result, Err(AppError::NoKeywordsExtracted)));
    }

    #[tokio::test]
    async fn test_end_to_end_with_fallback_and_failed_fetch() {
        // Model down -> fallback keywords ["amazon", "refund"]; one candidate
        // fetch fails and is silently dropped; sender heuristic keeps m1.
        let mail = MockMailProvider {
            messages: vec![
                email("m1", "Your package", "shipment@amazon.com", "tracking inside"),
                email("m2", "Lunch?", "friend@example.com", "tacos on friday"),
            ],
            failing_ids: vec!["m3".to_string()],
        };
        let state = state_with(None, mail);

        let response = search(
            State(state),
            authed(),
            Json(SearchRequest { query: "emails from Amazon about my refund".to_string() }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.keywords, vec!["amazon".to_string(), "refund".to_string()]);
        assert_eq!(response.0.emails.len(), 1);
        assert_eq!(response.0.emails[0].id, "m1");
    }

    #[tokio::test]
    async fn test_model_keywords_drive_filtering() {
        let mail = MockMailProvider {
            messages: vec![
                email("m1", "Q3 report attached", "cfo@contoso.com", "see attachment"),
                email("m2", "Q35 report", "spam@example.com", "not the droids"),
            ],
            failing_ids: vec![],
        };
        let state = state_with(Some("Q3 report"), mail);

        let response = search(
            State(state),
            authed(),
            Json(SearchRequest { query: "find the Q3 report".to_string() }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.emails.len(), 1);
        assert_eq!(response.0.emails[0].id, "m1");
    }
}
