//! Service layer: collaborator clients and the resolution core
//!
//! The four collaborator traits are the seams the job orchestrator depends
//! on. Production implementations talk HTTP; tests substitute in-process
//! fakes.

pub mod article_extractor;
pub mod gemini;
pub mod geocoding;
pub mod location_extractor;
pub mod placement_resolver;
pub mod resolution_pipeline;
pub mod spatial_filter;
pub mod summarizer;
pub mod workflow;

pub use article_extractor::{ArticleExtractionError, ExtractedArticle, HttpArticleExtractor};
pub use gemini::{GeminiClient, LlmError};
pub use geocoding::{GeocodeError, NominatimClient, RawPlace};
pub use location_extractor::{CandidateExtractionError, GeminiLocationExtractor};
pub use placement_resolver::{contains, GeoPlacementResolver};
pub use resolution_pipeline::{CandidateOutcome, PipelineOutput, ResolutionPipeline};
pub use spatial_filter::SpatialDeduplicator;
pub use summarizer::{GeminiSummarizer, SummarizeError};
pub use workflow::{JobError, LocationWorkflow};

use crate::models::LocationCandidate;
use async_trait::async_trait;
use reqwest::Url;

/// Turns a URL into article title and plain text
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ArticleExtractionError>;
}

/// Finds place mentions in article text
#[async_trait]
pub trait CandidateExtractor: Send + Sync {
    async fn extract_candidates(
        &self,
        text: &str,
    ) -> Result<Vec<LocationCandidate>, CandidateExtractionError>;
}

/// Writes a short narrative of what the article says happened at a place
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, location_name: &str) -> Result<String, SummarizeError>;
}

/// Looks up one place by name
///
/// `Ok(None)` means the provider answered but knows no such place.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<RawPlace>, GeocodeError>;
}
