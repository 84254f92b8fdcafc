//! Minimal Gemini `generateContent` client
//!
//! Shared by candidate extraction and summarization. Only single-turn text
//! prompts are supported.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY not configured")]
    NotConfigured,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    /// A client without a key is valid; every call then fails with `NotConfigured`
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        })
    }

    /// Send one prompt, return the concatenated text of the first candidate
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;
        let url = format!("{}/models/{}:generateContent", BASE_URL, self.model);

        debug!(model = %self.model, prompt_chars = prompt.len(), "Gemini request");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.error.message, envelope.error.status),
                Err(_) => (body, None),
            };
            if status.as_u16() == 429 || is_rate_limit_message(&message, api_status.as_deref()) {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_generate_response(&body)
    }
}

fn parse_generate_response(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

/// Provider errors that mean "slow down" even without a 429 status
fn is_rate_limit_message(message: &str, status: Option<&str>) -> bool {
    if status == Some("RESOURCE_EXHAUSTED") {
        return true;
    }
    let lower = message.to_lowercase();
    ["quota", "rate limit", "resource exhausted", "resource_exhausted"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_parts_joined() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}],"role":"model"}}]}"#;
        assert_eq!(parse_generate_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_empty_candidates() {
        assert!(matches!(
            parse_generate_response(r#"{"candidates":[]}"#),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit_message("Quota exceeded for metric", None));
        assert!(is_rate_limit_message("anything", Some("RESOURCE_EXHAUSTED")));
        assert!(!is_rate_limit_message("API key not valid", Some("INVALID_ARGUMENT")));
    }

    #[tokio::test]
    async fn test_missing_key_not_configured() {
        let client = GeminiClient::new(Some("  ".into()), "gemini-1.5-flash").unwrap();
        assert!(matches!(client.generate("hi").await, Err(LlmError::NotConfigured)));
    }
}
