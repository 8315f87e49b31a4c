//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub chat_model: CheckResult,
    pub mail_provider: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe
///
/// Mail access is per-user token, so there is no service credential to
/// probe; readiness reports configuration completeness instead.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let llm = &state.config.llm;
    let chat_check = if llm.provider == "openai" && llm.api_key.is_none() {
        CheckResult {
            status: "down".to_string(),
            error: Some("llm.api_key not configured".to_string()),
        }
    } else {
        CheckResult {
            status: "up".to_string(),
            error: None,
        }
    };

    let mail_check = if state.config.mail.api_base.is_empty() {
        CheckResult {
            status: "down".to_string(),
            error: Some("mail.api_base not configured".to_string()),
        }
    } else {
        CheckResult {
            status: "up".to_string(),
            error: None,
        }
    };

    let all_healthy = chat_check.status == "up" && mail_check.status == "up";

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            chat_model: chat_check,
            mail_provider: mail_check,
        },
    })
}
