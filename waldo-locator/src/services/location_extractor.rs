//! Candidate extraction through Gemini

use super::gemini::{GeminiClient, LlmError};
use super::CandidateExtractor;
use crate::models::{ConfidenceTier, LocationCandidate};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Article characters included in the prompt
const PROMPT_TEXT_CHARS: usize = 4_000;

/// Suggested client back-off after the provider rate-limits us
pub const RATE_LIMIT_RETRY_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum CandidateExtractionError {
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("GEMINI_API_KEY not configured")]
    NotConfigured,

    #[error("Candidate extraction failed: {0}")]
    Failed(String),
}

impl From<LlmError> for CandidateExtractionError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited(_) => CandidateExtractionError::RateLimited {
                retry_after_secs: RATE_LIMIT_RETRY_SECS,
            },
            LlmError::NotConfigured => CandidateExtractionError::NotConfigured,
            other => CandidateExtractionError::Failed(other.to_string()),
        }
    }
}

/// Loose shape of one model-produced element, validated into a candidate
#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    original_text: String,
    #[serde(default)]
    standardized_name: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    location_type: String,
    #[serde(default)]
    disambiguation_hints: Vec<String>,
}

pub struct GeminiLocationExtractor {
    client: Arc<GeminiClient>,
}

impl GeminiLocationExtractor {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CandidateExtractor for GeminiLocationExtractor {
    async fn extract_candidates(
        &self,
        text: &str,
    ) -> Result<Vec<LocationCandidate>, CandidateExtractionError> {
        let response = self.client.generate(&build_prompt(text)).await?;
        let candidates = parse_candidates(&response)?;
        debug!(count = candidates.len(), "Candidates extracted");
        Ok(candidates)
    }
}

fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(PROMPT_TEXT_CHARS).collect();
    format!(
        r#"Analyze the following news article and extract ALL geographic locations mentioned.
Include cities, states, countries, landmarks, neighborhoods, and any other specific places.

Return ONLY a JSON array, no other text. Each element must be an object with these fields:
- "original_text": the mention exactly as written
- "standardized_name": a name suitable for a geocoding search (e.g. "Paris, France")
- "context": the phrase or sentence where it appears
- "confidence": one of "high", "medium", "low"
- "location_type": city, state, country, landmark, neighborhood, region, or other
- "disambiguation_hints": list of strings that help pick the right place

Article text:
{}"#,
        excerpt
    )
}

/// Parse the model's reply into candidates
///
/// Elements are validated one by one; a malformed element is dropped
/// without discarding the rest. A reply with no array yields no candidates.
fn parse_candidates(response: &str) -> Result<Vec<LocationCandidate>, CandidateExtractionError> {
    let cleaned = strip_code_fences(response);
    let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) else {
        debug!("No JSON array in extraction response");
        return Ok(Vec::new());
    };
    if end < start {
        return Ok(Vec::new());
    }

    let elements: Vec<serde_json::Value> = serde_json::from_str(&cleaned[start..=end])
        .map_err(|e| CandidateExtractionError::Failed(format!("Invalid JSON: {}", e)))?;

    Ok(elements.into_iter().filter_map(validate_element).collect())
}

fn validate_element(value: serde_json::Value) -> Option<LocationCandidate> {
    let raw: RawCandidate = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed candidate");
            return None;
        }
    };

    let standardized_name = raw.standardized_name.trim().to_string();
    if standardized_name.is_empty() {
        warn!(original_text = %raw.original_text, "Rejecting candidate without a name");
        return None;
    }

    let confidence_tier = match raw.confidence.parse::<ConfidenceTier>() {
        Ok(tier) => tier,
        Err(e) => {
            warn!(location = %standardized_name, error = %e, "Rejecting candidate");
            return None;
        }
    };

    let original_text = match raw.original_text.trim() {
        "" => standardized_name.clone(),
        text => text.to_string(),
    };

    Some(LocationCandidate {
        original_text,
        standardized_name,
        context: raw.context,
        confidence_tier,
        location_type: raw.location_type,
        disambiguation_hints: raw.disambiguation_hints,
    })
}

fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
