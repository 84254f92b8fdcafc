//! Concurrent per-candidate resolution
//!
//! Each candidate is geocoded, then summarized, independently of the
//! others. At most `DEFAULT_CONCURRENCY` candidates are in flight; outcomes arrive
//! in completion order, not input order.

use super::placement_resolver::GeoPlacementResolver;
use super::Summarizer;
use crate::models::{
    GeographicPlacement, LocationCandidate, ResolvedLocation, Warning, FALLBACK_SUMMARY,
};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Candidates resolved simultaneously
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Result of resolving one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Resolved {
        location: ResolvedLocation,
        placement: GeographicPlacement,
    },
    GeocodingFailed {
        name: String,
    },
}

impl CandidateOutcome {
    /// Standardized name of the candidate this outcome belongs to
    pub fn name(&self) -> &str {
        match self {
            CandidateOutcome::Resolved { location, .. } => &location.name,
            CandidateOutcome::GeocodingFailed { name } => name,
        }
    }
}

/// Collected pipeline output
///
/// `locations[i]` was built from `placements[i]`; neither is aligned with
/// the input candidate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutput {
    pub locations: Vec<ResolvedLocation>,
    pub placements: Vec<GeographicPlacement>,
    pub warnings: Vec<Warning>,
}

impl PipelineOutput {
    pub fn push(&mut self, outcome: CandidateOutcome) {
        match outcome {
            CandidateOutcome::Resolved {
                location,
                placement,
            } => {
                self.locations.push(location);
                self.placements.push(placement);
            }
            CandidateOutcome::GeocodingFailed { name } => {
                self.warnings.push(Warning::geocoding_failed(&name));
            }
        }
    }
}

pub struct ResolutionPipeline {
    resolver: Arc<GeoPlacementResolver>,
    summarizer: Arc<dyn Summarizer>,
}

impl ResolutionPipeline {
    pub fn new(resolver: Arc<GeoPlacementResolver>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            resolver,
            summarizer,
        }
    }

    /// Geocode, then summarize, one candidate
    ///
    /// Summarizer failures degrade to the fallback narrative.
    pub async fn resolve_candidate(
        &self,
        candidate: LocationCandidate,
        article_text: &str,
    ) -> CandidateOutcome {
        let name = candidate.standardized_name.as_str();

        let Some(placement) = self.resolver.resolve(name).await else {
            warn!(location = %name, "Could not find coordinates");
            return CandidateOutcome::GeocodingFailed {
                name: candidate.standardized_name,
            };
        };

        let summary = match self.summarizer.summarize(article_text, name).await {
            Ok(summary) => summary,
            Err(e) => {
                debug!(location = %name, error = %e, "Summary unavailable, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
        };

        let location = ResolvedLocation::from_parts(&candidate, &placement, summary);
        CandidateOutcome::Resolved {
            location,
            placement,
        }
    }

    /// Outcomes as candidates finish
    pub fn outcomes<'a>(
        &'a self,
        candidates: Vec<LocationCandidate>,
        article_text: &'a str,
    ) -> impl Stream<Item = CandidateOutcome> + Send + 'a {
        stream::iter(candidates)
            .map(move |candidate| self.resolve_candidate(candidate, article_text))
            .buffer_unordered(DEFAULT_CONCURRENCY)
    }

    /// Resolve every candidate and collect the results
    pub async fn run(
        &self,
        candidates: Vec<LocationCandidate>,
        article_text: &str,
    ) -> PipelineOutput {
        let mut output = PipelineOutput::default();
        let outcomes = self.outcomes(candidates, article_text);
        futures::pin_mut!(outcomes);

        while let Some(outcome) = outcomes.next().await {
            output.push(outcome);
        }
        output
    }
}
