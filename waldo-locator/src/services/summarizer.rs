//! Per-location narrative summaries through Gemini

use super::gemini::{GeminiClient, LlmError};
use super::Summarizer;
use crate::models::FALLBACK_SUMMARY;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

const PROMPT_TEXT_CHARS: usize = 3_000;
const MAX_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Summary generation failed: {0}")]
    Llm(String),
}

impl From<LlmError> for SummarizeError {
    fn from(e: LlmError) -> Self {
        SummarizeError::Llm(e.to_string())
    }
}

pub struct GeminiSummarizer {
    client: Arc<GeminiClient>,
}

impl GeminiSummarizer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str, location_name: &str) -> Result<String, SummarizeError> {
        let excerpt: String = text.chars().take(PROMPT_TEXT_CHARS).collect();
        let prompt = format!(
            r#"Based on the following news article, provide a brief 1-2 sentence summary of what happened at "{name}".
If the location is only mentioned in passing or no specific events are described there, return "{fallback}"

Focus only on events, actions, or incidents that occurred at this specific location.

Article text:
{excerpt}

Location: {name}

Summary:"#,
            name = location_name,
            fallback = FALLBACK_SUMMARY,
            excerpt = excerpt,
        );

        let response = self.client.generate(&prompt).await?;
        Ok(clamp_summary(&response))
    }
}

/// Trim, cap at 200 characters, and fall back when empty
fn clamp_summary(response: &str) -> String {
    let summary = response.trim();
    if summary.is_empty() {
        return FALLBACK_SUMMARY.to_string();
    }
    if summary.chars().count() > MAX_SUMMARY_CHARS {
        let mut clipped: String = summary.chars().take(MAX_SUMMARY_CHARS - 3).collect();
        clipped.push_str("...");
        return clipped;
    }
    summary.to_string()
}
