//! MailSift Common Library
//!
//! Shared code for the MailSift services including:
//! - Query understanding and relevance filtering (the search pipeline)
//! - Chat model client abstraction
//! - Error types and handling
//! - Configuration management
//! - Authentication pass-through utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod search;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use llm::ChatModel;
pub use search::{CandidateEmail, KeywordResolver};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
