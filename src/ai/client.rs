use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error messages containing any of these are final and never retried.
pub const NON_RETRYABLE_MARKERS: &[&str] = &["invalid api key", "quota exceeded", "model not found"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Generation parameters plus the retry policy applied around each request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Total number of attempts.
    pub retries: u32,
    /// Per-attempt deadline.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

impl CompletionOptions {
    /// Plan generation: long output, fewer retries, longer deadline.
    pub fn plan_generation() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 10_000,
            retries: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
}

impl Completion {
    /// The model stopped because it ran out of tokens.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API timeout")]
    Timeout,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("completion API failed after retries")]
    RetriesExhausted,
}

impl CompletionError {
    /// Authentication, quota and unknown-model failures are final.
    pub fn is_retryable(&self) -> bool {
        let message = self.to_string().to_lowercase();
        !NON_RETRYABLE_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.to_string().to_lowercase().contains("quota exceeded")
    }

    pub fn is_invalid_api_key(&self) -> bool {
        self.to_string().to_lowercase().contains("invalid api key")
    }
}

/// A remote chat-completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model name used when the response does not report one.
    fn model(&self) -> &str;

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(message: &str) -> CompletionError {
        CompletionError::Api {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_non_retryable_markers_are_case_insensitive() {
        assert!(!api_error("Invalid API key: sk-***").is_retryable());
        assert!(!api_error("quota exceeded: insufficient_quota").is_retryable());
        assert!(!api_error("Model not found: gpt-x").is_retryable());
    }

    #[test]
    fn test_other_errors_are_retryable() {
        assert!(api_error("API error (500): overloaded").is_retryable());
        assert!(CompletionError::Timeout.is_retryable());
        assert!(CompletionError::Transport("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_truncation() {
        let completion = Completion {
            content: Some("{".into()),
            finish_reason: Some("length".into()),
            model: "m".into(),
            usage: TokenUsage::default(),
        };
        assert!(completion.is_truncated());
    }
}
