//! `OpenAI`-compatible chat completions over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{
    ChatMessage, Completion, CompletionClient, CompletionError, CompletionOptions, TokenUsage,
};
use crate::config::OpenAiConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TOP_P: f32 = 0.9;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Returns `Ok(None)` when no API key is configured.
    pub fn from_config(config: &OpenAiConfig) -> Result<Option<Self>, CompletionError> {
        match &config.api_key {
            Some(api_key) => Self::new(api_key, &config.base_url, &config.model).map(Some),
            None => Ok(None),
        }
    }

    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, CompletionError> {
        // Per-attempt deadlines are enforced by the retry wrapper.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Maps an error response onto messages the retry policy recognizes.
fn parse_error_response(status: StatusCode, body: &str) -> CompletionError {
    let detail = serde_json::from_str::<ErrorResponse>(body).ok().map(|r| r.error);
    let text = detail
        .as_ref()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());
    let code = detail
        .as_ref()
        .and_then(|d| d.code.clone().or_else(|| d.error_type.clone()))
        .unwrap_or_default();

    let message = match status.as_u16() {
        401 => format!("invalid api key: {text}"),
        429 if code == "insufficient_quota" => format!("quota exceeded: {text}"),
        404 => format!("model not found: {text}"),
        _ if code == "model_not_found" => format!("model not found: {text}"),
        _ => format!("API error ({status}): {text}"),
    };

    CompletionError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: TOP_P,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(parse_error_response(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("no choices returned".to_string()))?;

        Ok(Completion {
            content: choice.message.content,
            finish_reason: choice.finish_reason,
            model: parsed.model,
            usage: parsed
                .usage
                .map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_invalid_api_key() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let error = parse_error_response(StatusCode::UNAUTHORIZED, body);
        assert!(error.is_invalid_api_key());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_insufficient_quota_is_final() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let error = parse_error_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(error.is_quota_exceeded());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        let error = parse_error_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_unknown_model_is_final() {
        let body = r#"{"error":{"message":"The model `gpt-x` does not exist","code":"model_not_found"}}"#;
        let error = parse_error_response(StatusCode::BAD_REQUEST, body);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_non_json_error_body() {
        let error = parse_error_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(error.to_string().contains("502"));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new("key", "http://localhost:1234/v1/", "m").unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:1234/v1/chat/completions"
        );
    }
}
