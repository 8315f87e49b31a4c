//! Chat model abstraction
//!
//! Provides a unified interface for chat completion providers:
//! - OpenAI-compatible endpoints (gpt-4o-mini by default)
//! - Mock model for tests and local development
//!
//! The model is treated as an untrusted black box returning plain text.
//! Retries happen at the transport layer only; callers decide what to do
//! with semantically useless output.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for chat completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a system + user message pair and return the raw text reply
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat client
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

impl OpenAiChatModel {
    /// Create a new OpenAI chat client
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            timeout,
            max_retries,
        })
    }

    /// Make request with retry
    async fn request_with_retry(&self, system: &str, user: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(system, user).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Chat model request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::ModelError {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ModelTimeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    AppError::ModelError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModelError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::ModelError {
            message: format!("Failed to parse response: {}", e),
        })?;

        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::ModelError {
                message: "Empty response from model".to_string(),
            })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.request_with_retry(system, user).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock chat model for testing
///
/// Returns a canned response, or a transport-style error when constructed
/// with `failing()`.
pub struct MockChatModel {
    response: Option<String>,
}

impl MockChatModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    /// A model that fails every call, as an unreachable endpoint would
    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(AppError::ModelError {
                message: "mock model unavailable".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Create a chat model based on configuration
pub fn create_chat_model(
    provider: &str,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    max_retries: u32,
) -> Result<Arc<dyn ChatModel>> {
    match provider {
        "openai" => {
            let key = api_key.ok_or_else(|| AppError::Configuration {
                message: "OpenAI API key required".to_string(),
            })?;
            Ok(Arc::new(OpenAiChatModel::new(
                key,
                model,
                base_url,
                timeout,
                max_retries,
            )?))
        }
        "mock" => Ok(Arc::new(MockChatModel::new("mock response"))),
        _ => {
            tracing::warn!(provider = provider, "Unknown chat model provider, using mock");
            Ok(Arc::new(MockChatModel::new("mock response")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chat_model() {
        let model = MockChatModel::new("amazon, refund");
        let reply = model.complete("system", "user").await.unwrap();
        assert_eq!(reply, "amazon, refund");
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let model = MockChatModel::failing();
        assert!(model.complete("system", "user").await.is_err());
    }

    #[test]
    fn test_factory_requires_key_for_openai() {
        let result = create_chat_model(
            "openai",
            None,
            None,
            None,
            Duration::from_secs(30),
            3,
        );
        assert!(result.is_err());
    }
}
