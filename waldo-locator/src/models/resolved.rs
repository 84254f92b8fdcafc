//! Resolution output: scored locations, warnings, and the final article result

use super::candidate::LocationCandidate;
use super::placement::GeographicPlacement;
use serde::{Deserialize, Serialize};

/// Fallback narrative when no summary could be generated
pub const FALLBACK_SUMMARY: &str = "Mentioned in article.";

/// How a candidate was turned into a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Geocoded by its standardized name
    Direct,
}

/// A geocoded, summarized, scored location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "events_summary")]
    pub summary: String,
    /// 0.0 - 1.0, derived from the candidate's confidence tier
    pub confidence: f64,
    pub resolution_method: ResolutionMethod,
    pub original_text: String,
}

impl ResolvedLocation {
    pub fn from_parts(
        candidate: &LocationCandidate,
        placement: &GeographicPlacement,
        summary: String,
    ) -> Self {
        Self {
            name: candidate.standardized_name.clone(),
            latitude: placement.latitude,
            longitude: placement.longitude,
            summary,
            confidence: candidate.confidence_tier.score(),
            resolution_method: ResolutionMethod::Direct,
            original_text: candidate.original_text.clone(),
        }
    }
}

/// Non-fatal condition attached to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    GeocodingFailed,
    SpatialHierarchyFiltered,
    TextTruncated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl Warning {
    pub fn geocoding_failed(name: &str) -> Self {
        Self {
            code: WarningCode::GeocodingFailed,
            message: format!("Could not find coordinates for '{}'", name),
        }
    }

    pub fn spatial_hierarchy_filtered(removed: usize) -> Self {
        Self {
            code: WarningCode::SpatialHierarchyFiltered,
            message: format!(
                "Filtered out {} broader location(s) contained within more specific ones",
                removed
            ),
        }
    }

    pub fn text_truncated(limit: usize) -> Self {
        Self {
            code: WarningCode::TextTruncated,
            message: format!(
                "Article text was truncated to {} characters for processing",
                format_thousands(limit)
            ),
        }
    }
}

/// Final outcome of a successful job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResult {
    pub article_title: Option<String>,
    /// Text the locations were extracted from (after truncation)
    pub article_text: String,
    pub locations: Vec<ResolvedLocation>,
    /// Wall-clock seconds from job start to completion
    pub processing_time: f64,
    pub warnings: Vec<Warning>,
}

/// `50000` → `"50,000"`
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
