//! AI assist handlers
//!
//! Thin pass-throughs over the chat model: summarize an email, draft a
//! reply. No decision logic lives here; validation and error mapping only.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use mailsift_common::errors::{AppError, Result};

const SUMMARIZE_SYSTEM: &str =
    "You summarize emails. Reply with a short plain-text summary, three sentences at most.";

const DRAFT_SYSTEM: &str =
    "You draft professional emails. Reply with the email body only, no subject line, \
     no explanations.";

/// Summarize request
#[derive(Debug, Deserialize, Validate)]
pub struct SummarizeRequest {
    /// Email body to summarize
    #[validate(length(min = 1, max = 50_000))]
    pub body: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub processing_time_ms: u64,
}

/// Draft request
#[derive(Debug, Deserialize, Validate)]
pub struct DraftRequest {
    /// What the reply should say
    #[validate(length(min = 1, max = 2000))]
    pub instruction: String,

    /// Optional thread context the draft should respond to
    pub thread_context: Option<String>,
}

#[derive(Serialize)]
pub struct DraftResponse {
    pub draft: String,
    pub processing_time_ms: u64,
}

/// Summarize an email body
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let summary = state
        .chat
        .complete(SUMMARIZE_SYSTEM, &format!("Summarize this email:\n\n{}", request.body))
        .await?;

    Ok(Json(SummarizeResponse {
        summary: summary.trim().to_string(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Draft a reply from an instruction and optional thread context
pub async fn draft(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<DraftResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let mut prompt = format!("Write an email that does the following: {}", request.instruction);
    if let Some(context) = &request.thread_context {
        prompt.push_str(&format!("\n\nIt replies to this thread:\n{}", context));
    }

    let draft = state.chat.complete(DRAFT_SYSTEM, &prompt).await?;

    Ok(Json(DraftResponse {
        draft: draft.trim().to_string(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
