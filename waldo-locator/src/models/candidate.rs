//! Place mentions produced by the candidate extraction service

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How sure the extraction model is that a mention is a real place
///
/// Closed set: anything else is rejected at the parsing boundary rather
/// than silently mapped to a default score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Numeric confidence attached to a resolved location
    pub fn score(self) -> f64 {
        match self {
            ConfidenceTier::High => 0.9,
            ConfidenceTier::Medium => 0.8,
            ConfidenceTier::Low => 0.6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Tier string outside {high, medium, low}
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized confidence tier: '{0}'")]
pub struct UnknownConfidenceTier(pub String);

impl FromStr for ConfidenceTier {
    type Err = UnknownConfidenceTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ConfidenceTier::High),
            "medium" => Ok(ConfidenceTier::Medium),
            "low" => Ok(ConfidenceTier::Low),
            _ => Err(UnknownConfidenceTier(s.to_string())),
        }
    }
}

/// One raw place mention, not yet geocoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    /// Mention exactly as written in the article
    pub original_text: String,
    /// Name suitable for a geocoder query
    pub standardized_name: String,
    /// Surrounding sentence or phrase
    pub context: String,
    #[serde(rename = "confidence")]
    pub confidence_tier: ConfidenceTier,
    /// Model's guess at the kind of place (city, country, landmark, ...)
    pub location_type: String,
    pub disambiguation_hints: Vec<String>,
}

impl LocationCandidate {
    /// Candidate with only a name and tier; remaining fields empty
    pub fn named(name: impl Into<String>, tier: ConfidenceTier) -> Self {
        let name = name.into();
        Self {
            original_text: name.clone(),
            standardized_name: name,
            context: String::new(),
            confidence_tier: tier,
            location_type: String::new(),
            disambiguation_hints: Vec::new(),
        }
    }
}
