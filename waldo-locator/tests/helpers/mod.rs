//! Shared test fixtures: in-process fakes for every external collaborator
//!
//! Each integration test binary includes this module and uses a subset of
//! it.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Url;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use waldo_locator::config::ServiceConfig;
use waldo_locator::models::{ConfidenceTier, LocationCandidate};
use waldo_locator::services::{
    ArticleExtractionError, CandidateExtractionError, CandidateExtractor, ContentExtractor,
    ExtractedArticle, GeoPlacementResolver, GeocodeError, GeocodingProvider, LocationWorkflow,
    RawPlace, ResolutionPipeline, SummarizeError, Summarizer,
};
use waldo_locator::AppState;

/// Content extractor returning a fixed article, or failing when `None`
pub struct FakeContentExtractor {
    pub article: Option<ExtractedArticle>,
}

#[async_trait]
impl ContentExtractor for FakeContentExtractor {
    async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ArticleExtractionError> {
        self.article
            .clone()
            .ok_or_else(|| ArticleExtractionError::Fetch(format!("connection refused: {}", url)))
    }
}

/// What the fake candidate extractor does when called
#[derive(Clone)]
pub enum ExtractorBehavior {
    Candidates(Vec<LocationCandidate>),
    RateLimited,
    NotConfigured,
    Failed,
    /// Never returns; only cancellation ends the job
    Hang,
    Panic,
}

pub struct ScriptedCandidateExtractor {
    pub behavior: ExtractorBehavior,
}

#[async_trait]
impl CandidateExtractor for ScriptedCandidateExtractor {
    async fn extract_candidates(
        &self,
        _text: &str,
    ) -> Result<Vec<LocationCandidate>, CandidateExtractionError> {
        match &self.behavior {
            ExtractorBehavior::Candidates(candidates) => Ok(candidates.clone()),
            ExtractorBehavior::RateLimited => Err(CandidateExtractionError::RateLimited {
                retry_after_secs: 60,
            }),
            ExtractorBehavior::NotConfigured => Err(CandidateExtractionError::NotConfigured),
            ExtractorBehavior::Failed => {
                Err(CandidateExtractionError::Failed("model returned garbage".into()))
            }
            ExtractorBehavior::Hang => std::future::pending().await,
            ExtractorBehavior::Panic => panic!("extractor exploded"),
        }
    }
}

pub struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, _text: &str, location_name: &str) -> Result<String, SummarizeError> {
        Ok(format!("Events reported in {}.", location_name))
    }
}

/// Geocoder backed by a fixed name → payload table
pub struct FakeGeocoder {
    pub places: HashMap<String, RawPlace>,
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn lookup(&self, name: &str) -> Result<Option<RawPlace>, GeocodeError> {
        if name == "Unreachable" {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.places.get(name).cloned())
    }
}

pub fn raw_place(
    lat: f64,
    lon: f64,
    bbox: (f64, f64, f64, f64),
    address: &[(&str, &str)],
) -> RawPlace {
    RawPlace {
        lat: lat.to_string(),
        lon: lon.to_string(),
        boundingbox: Some(vec![
            bbox.0.to_string(),
            bbox.1.to_string(),
            bbox.2.to_string(),
            bbox.3.to_string(),
        ]),
        address: Some(
            address
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..RawPlace::default()
    }
}

/// USA, Washington DC, New York City, London
pub fn gazetteer() -> FakeGeocoder {
    let places = HashMap::from([
        (
            "USA".to_string(),
            raw_place(39.83, -98.58, (18.91, 71.36, -179.23, 179.86), &[("country", "United States")]),
        ),
        (
            "Washington DC".to_string(),
            raw_place(
                38.9072,
                -77.0369,
                (38.79, 38.996, -77.12, -76.91),
                &[("city", "Washington"), ("country", "United States")],
            ),
        ),
        (
            "New York City".to_string(),
            raw_place(
                40.7128,
                -74.006,
                (40.4774, 40.9176, -74.2591, -73.7004),
                &[("city", "New York"), ("country", "United States")],
            ),
        ),
        (
            "London".to_string(),
            raw_place(
                51.5074,
                -0.1278,
                (51.2868, 51.6919, -0.5103, 0.334),
                &[("city", "London"), ("country", "United Kingdom")],
            ),
        ),
    ]);
    FakeGeocoder { places }
}

pub fn candidate(name: &str, tier: ConfidenceTier) -> LocationCandidate {
    LocationCandidate::named(name, tier)
}

pub fn workflow_with(
    behavior: ExtractorBehavior,
    article: Option<ExtractedArticle>,
    job_timeout: Duration,
) -> Arc<LocationWorkflow> {
    let resolver = Arc::new(GeoPlacementResolver::new(Arc::new(gazetteer())));
    let pipeline = Arc::new(ResolutionPipeline::new(resolver, Arc::new(EchoSummarizer)));
    Arc::new(LocationWorkflow::new(
        Arc::new(FakeContentExtractor { article }),
        Arc::new(ScriptedCandidateExtractor { behavior }),
        pipeline,
        job_timeout,
    ))
}

pub fn workflow(behavior: ExtractorBehavior) -> Arc<LocationWorkflow> {
    workflow_with(behavior, None, Duration::from_secs(10))
}

/// Short timings so stream and eviction tests finish quickly
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        gemini_api_key: Some("test-key".into()),
        heartbeat_interval: Duration::from_millis(20),
        stream_close_grace: Duration::from_millis(10),
        session_retention: Duration::from_millis(300),
        job_timeout: Duration::from_secs(10),
        ..ServiceConfig::default()
    }
}

pub fn test_state(behavior: ExtractorBehavior) -> AppState {
    AppState::new(workflow(behavior), test_config())
}
