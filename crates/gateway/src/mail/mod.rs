//! Mail provider abstraction
//!
//! Thin boundary over the Gmail REST API: list message IDs for a provider
//! query, fetch a single message. The gateway passes the user's OAuth access
//! token through on every call; no tokens are stored here.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use mailsift_common::{
    errors::{AppError, Result},
    search::CandidateEmail,
};
use serde::Deserialize;
use std::time::Duration;

/// Trait for candidate email retrieval
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// List message IDs matching a provider query string
    async fn list_message_ids(
        &self,
        access_token: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>>;

    /// Fetch a single message by ID
    async fn fetch_message(&self, access_token: &str, id: &str) -> Result<CandidateEmail>;
}

/// Gmail REST API client
pub struct GmailProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(rename = "internalDate")]
    internal_date: Option<String>,
    payload: Option<MessagePayload>,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
    body: Option<MessageBody>,
    #[serde(default)]
    parts: Vec<MessagePayload>,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct MessageBody {
    data: Option<String>,
}

impl GmailProvider {
    /// Create a new Gmail client
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    fn header_value(payload: &MessagePayload, name: &str) -> String {
        payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    }

    /// Decode a base64url body segment, tolerating padding
    fn decode_body(data: &str) -> String {
        let trimmed = data.trim_end_matches('=');
        URL_SAFE_NO_PAD
            .decode(trimmed)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }

    /// Walk the MIME tree for the first part of the given type
    fn find_mime_text(payload: &MessagePayload, mime: &str) -> Option<String> {
        if payload.mime_type.as_deref() == Some(mime) {
            if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
                let text = Self::decode_body(data);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        payload
            .parts
            .iter()
            .find_map(|p| Self::find_mime_text(p, mime))
    }

    /// Extract message text, preferring text/plain over text/html
    fn extract_text(payload: &MessagePayload) -> String {
        Self::find_mime_text(payload, "text/plain")
            .or_else(|| Self::find_mime_text(payload, "text/html"))
            .or_else(|| {
                // Untyped single-part messages carry the body at the top level
                payload
                    .body
                    .as_ref()
                    .and_then(|b| b.data.as_deref())
                    .map(Self::decode_body)
            })
            .unwrap_or_default()
    }

    fn parse_date(internal_date: Option<&str>) -> Option<DateTime<Utc>> {
        internal_date
            .and_then(|d| d.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    async fn list_message_ids(
        &self,
        access_token: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>> {
        let url = format!("{}/users/me/messages", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("q", query), ("maxResults", &max_results.to_string())])
            .send()
            .await
            .map_err(|e| AppError::MailProviderError {
                message: format!("Message listing failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MailProviderError {
                message: format!("Message listing error {}: {}", status, body),
            });
        }

        let list: ListResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::MailProviderError {
                    message: format!("Failed to parse listing response: {}", e),
                })?;

        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_message(&self, access_token: &str, id: &str) -> Result<CandidateEmail> {
        let url = format!("{}/users/me/messages/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(|e| AppError::MailProviderError {
                message: format!("Message fetch failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::MailProviderError {
                message: format!("Message fetch error {} for {}", status, id),
            });
        }

        let message: MessageResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::MailProviderError {
                    message: format!("Failed to parse message {}: {}", id, e),
                })?;

        let payload = message.payload.ok_or_else(|| AppError::MailProviderError {
            message: format!("Message {} has no payload", message.id),
        })?;

        Ok(CandidateEmail {
            id: message.id,
            subject: Self::header_value(&payload, "Subject"),
            from: Self::header_value(&payload, "From"),
            body: Self::extract_text(&payload),
            date: Self::parse_date(message.internal_date.as_deref()),
        })
    }
}

/// Mock provider for handler tests
#[cfg(test)]
pub struct MockMailProvider {
    pub messages: Vec<CandidateEmail>,
    pub failing_ids: Vec<String>,
}

#[cfg(test)]
#[async_trait]
impl MailProvider for MockMailProvider {
    async fn list_message_ids(
        &self,
        _access_token: &str,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<String>> {
        Ok(self
            .messages
            .iter()
            .map(|m| m.id.clone())
            .chain(self.failing_ids.iter().cloned())
            .take(max_results)
            .collect())
    }

    async fn fetch_message(&self, _access_token: &str, id: &str) -> Result<CandidateEmail> {
        if self.failing_ids.iter().any(|f| f == id) {
            return Err(AppError::MailProviderError {
                message: format!("mock fetch failure for {}", id),
            });
        }
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::MailProviderError {
                message: format!("unknown message {}", id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body_tolerates_padding() {
        // "refund" base64url-encoded, with and without padding
        assert_eq!(GmailProvider::decode_body("cmVmdW5k"), "refund");
        assert_eq!(GmailProvider::decode_body("cmVmdW5kcw=="), "refunds");
    }

    #[test]
    fn test_decode_body_invalid_is_empty() {
        assert_eq!(GmailProvider::decode_body("!!not base64!!"), "");
    }

    #[test]
    fn test_parse_date() {
        let date = GmailProvider::parse_date(Some("1700000000000")).unwrap();
        assert_eq!(date.timestamp_millis(), 1_700_000_000_000);
        assert!(GmailProvider::parse_date(Some("not-a-number")).is_none());
        assert!(GmailProvider::parse_date(None).is_none());
    }

    #[test]
    fn test_extract_text_prefers_plain_part() {
        let payload = MessagePayload {
            headers: vec![],
            body: None,
            mime_type: Some("multipart/alternative".to_string()),
            parts: vec![
                MessagePayload {
                    headers: vec![],
                    body: Some(MessageBody {
                        data: Some("PGI+aHRtbDwvYj4".to_string()),
                    }),
                    mime_type: Some("text/html".to_string()),
                    parts: vec![],
                },
                MessagePayload {
                    headers: vec![],
                    body: Some(MessageBody {
                        data: Some("cmVmdW5k".to_string()),
                    }),
                    mime_type: Some("text/plain".to_string()),
                    parts: vec![],
                },
            ],
        };

        assert_eq!(GmailProvider::extract_text(&payload), "refund");
    }
}
