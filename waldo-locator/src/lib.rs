//! waldo-locator library interface
//!
//! Exposes the application state and router so integration tests can drive
//! the service in-process.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::config::ServiceConfig;
use crate::progress::SessionRegistry;
use crate::services::{
    GeminiClient, GeminiLocationExtractor, GeminiSummarizer, GeoPlacementResolver,
    HttpArticleExtractor, LocationWorkflow, NominatimClient, ResolutionPipeline,
};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live and recently finished sessions
    pub registry: Arc<SessionRegistry>,
    /// Job orchestrator with its collaborators wired in
    pub workflow: Arc<LocationWorkflow>,
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(workflow: Arc<LocationWorkflow>, config: ServiceConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config.session_retention)),
            workflow,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }

    /// State backed by the production HTTP collaborators
    ///
    /// One geocoding client is shared by every job so its request budget is
    /// process-wide.
    pub fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let gemini = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?);
        let geocoder = Arc::new(NominatimClient::new(
            &config.nominatim_url,
            config.geocoder_requests_per_second,
        )?);

        let resolver = Arc::new(GeoPlacementResolver::new(geocoder));
        let summarizer = Arc::new(GeminiSummarizer::new(Arc::clone(&gemini)));
        let pipeline = Arc::new(ResolutionPipeline::new(resolver, summarizer));

        let workflow = Arc::new(LocationWorkflow::new(
            Arc::new(HttpArticleExtractor::new()?),
            Arc::new(GeminiLocationExtractor::new(gemini)),
            pipeline,
            config.job_timeout,
        ));

        Ok(Self::new(workflow, config))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::extract_routes())
        .merge(api::progress_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
