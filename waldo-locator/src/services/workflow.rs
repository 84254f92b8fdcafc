//! Job orchestration: one run per submitted article
//!
//! Drives the collaborators through the fixed phase sequence, reporting
//! each step on the session's broadcaster. A job always ends in exactly one
//! terminal event, whether it succeeds, fails, is cancelled, times out, or
//! panics.

use super::location_extractor::CandidateExtractionError;
use super::resolution_pipeline::{PipelineOutput, ResolutionPipeline};
use super::spatial_filter::SpatialDeduplicator;
use super::{CandidateExtractor, ContentExtractor};
use crate::models::request::TEXT_INPUT_TITLE;
use crate::models::resolved::format_thousands;
use crate::models::{ArticleInput, ArticleResult, FailureCode, JobFailure, Warning};
use crate::progress::{ProgressBroadcaster, ProgressError, SessionRegistry};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use waldo_common::events::ProgressPhase;

/// Article text beyond this many characters is not processed
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Characters of raw input shown as the current item
const PREVIEW_CHARS: usize = 100;

/// How long a timed-out job gets to notice cancellation before being aborted
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Terminal job failure
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Rate limit exceeded. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Failed to extract article from URL: {0}")]
    UrlExtraction(String),

    #[error("No content found in article")]
    NoContent,

    #[error("{0}")]
    Configuration(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Job exceeded the {0}s time limit")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    pub fn code(&self) -> FailureCode {
        match self {
            JobError::RateLimited { .. } => FailureCode::RateLimitExceeded,
            JobError::UrlExtraction(_) => FailureCode::UrlExtractionFailed,
            JobError::NoContent => FailureCode::NoContent,
            JobError::Configuration(_) => FailureCode::ConfigurationError,
            JobError::Cancelled => FailureCode::Cancelled,
            JobError::Timeout(_) => FailureCode::Timeout,
            JobError::Internal(_) => FailureCode::InternalError,
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            JobError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    pub fn to_failure(&self) -> JobFailure {
        JobFailure {
            code: self.code(),
            message: self.to_string(),
            retry_after_secs: self.retry_after_secs(),
        }
    }
}

impl From<ProgressError> for JobError {
    fn from(e: ProgressError) -> Self {
        JobError::Internal(e.to_string())
    }
}

pub struct LocationWorkflow {
    content_extractor: Arc<dyn ContentExtractor>,
    candidate_extractor: Arc<dyn CandidateExtractor>,
    pipeline: Arc<ResolutionPipeline>,
    deduplicator: SpatialDeduplicator,
    job_timeout: Duration,
}

impl LocationWorkflow {
    pub fn new(
        content_extractor: Arc<dyn ContentExtractor>,
        candidate_extractor: Arc<dyn CandidateExtractor>,
        pipeline: Arc<ResolutionPipeline>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            content_extractor,
            candidate_extractor,
            pipeline,
            deduplicator: SpatialDeduplicator::new(),
            job_timeout,
        }
    }

    /// Run the job in the background and schedule the session's eviction
    /// once it has finished
    pub fn spawn(
        self: &Arc<Self>,
        input: ArticleInput,
        session: Arc<ProgressBroadcaster>,
        registry: Arc<SessionRegistry>,
    ) -> JoinHandle<()> {
        let workflow = Arc::clone(self);
        tokio::spawn(async move {
            let session_id = session.session_id().to_string();
            workflow.execute(input, session).await;
            registry.schedule_eviction(&session_id);
        })
    }

    /// Run the job to its terminal event
    ///
    /// The job body runs in its own task so a panic is observed through
    /// its `JoinHandle` instead of unwinding into the caller.
    pub async fn execute(self: Arc<Self>, input: ArticleInput, session: Arc<ProgressBroadcaster>) {
        let session_id = session.session_id().to_string();
        let token = session.cancel_token();
        let started = Instant::now();

        info!(session_id = %session_id, is_url = input.is_url(), "Starting location job");

        let mut handle = tokio::spawn({
            let workflow = Arc::clone(&self);
            let session = Arc::clone(&session);
            async move { workflow.run(input, &session).await }
        });

        let outcome = match tokio::time::timeout(self.job_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let reason = if join_error.is_panic() {
                    "job task panicked"
                } else {
                    "job task aborted"
                };
                Err(JobError::Internal(reason.to_string()))
            }
            Err(_) => {
                warn!(session_id = %session_id, timeout_secs = self.job_timeout.as_secs(), "Job timed out, cancelling");
                token.cancel();
                if tokio::time::timeout(CANCEL_GRACE, &mut handle).await.is_err() {
                    handle.abort();
                }
                Err(JobError::Timeout(self.job_timeout.as_secs()))
            }
        };

        let finished = match outcome {
            Ok(result) => {
                let message = format!(
                    "Complete! Found {} locations in {:.1}s",
                    result.locations.len(),
                    started.elapsed().as_secs_f64()
                );
                info!(session_id = %session_id, locations = result.locations.len(), warnings = result.warnings.len(), "{}", message);
                session.complete(result, message)
            }
            Err(e) => {
                match &e {
                    JobError::Internal(_) => error!(session_id = %session_id, error = %e, "Location job failed"),
                    _ => warn!(session_id = %session_id, code = e.code().as_str(), error = %e, "Location job ended without result"),
                }
                session.fail(e.to_failure())
            }
        };

        if let Err(e) = finished {
            error!(session_id = %session_id, error = %e, "Could not record terminal event");
        }
    }

    /// Job body; returns the result the terminal `complete` event carries
    pub async fn run(
        &self,
        input: ArticleInput,
        session: &ProgressBroadcaster,
    ) -> Result<ArticleResult, JobError> {
        let started = Instant::now();
        let token = session.cancel_token();
        let session_id = session.session_id();

        session.emit(session.event(ProgressPhase::Starting, "Starting article processing...", 0.0))?;

        // Article acquisition
        let current_item = preview(input.as_str());
        let (title, text) = match &input {
            ArticleInput::Url(url) => {
                session.emit(
                    session
                        .event(ProgressPhase::ExtractingArticle, "Extracting content from URL...", 10.0)
                        .with_current_item(current_item),
                )?;
                let article = guarded(&token, self.content_extractor.extract(url))
                    .await?
                    .map_err(|e| JobError::UrlExtraction(e.to_string()))?;
                (article.title, article.text)
            }
            ArticleInput::Text(text) => {
                session.emit(
                    session
                        .event(ProgressPhase::ExtractingArticle, "Processing article text...", 10.0)
                        .with_current_item(current_item),
                )?;
                (Some(TEXT_INPUT_TITLE.to_string()), text.clone())
            }
        };

        if text.trim().is_empty() {
            return Err(JobError::NoContent);
        }

        let mut warnings = Vec::new();
        let (text, truncated) = truncate_chars(text, MAX_TEXT_CHARS);
        if truncated {
            info!(session_id = %session_id, limit = MAX_TEXT_CHARS, "Article text truncated");
            warnings.push(Warning::text_truncated(MAX_TEXT_CHARS));
        }

        // Candidate extraction
        session.emit(session.event(
            ProgressPhase::ExtractingLocations,
            format!(
                "Finding locations in {} character article...",
                format_thousands(text.chars().count())
            ),
            25.0,
        ))?;

        let candidates = match guarded(&token, self.candidate_extractor.extract_candidates(&text)).await? {
            Ok(candidates) => candidates,
            Err(CandidateExtractionError::RateLimited { retry_after_secs }) => {
                return Err(JobError::RateLimited { retry_after_secs });
            }
            Err(e @ CandidateExtractionError::NotConfigured) => {
                return Err(JobError::Configuration(e.to_string()));
            }
            Err(CandidateExtractionError::Failed(reason)) => {
                warn!(session_id = %session_id, error = %reason, "Candidate extraction failed, continuing with none");
                Vec::new()
            }
        };

        let total = candidates.len();
        info!(session_id = %session_id, candidates = total, "Candidates extracted");
        session.emit(
            session
                .event(
                    ProgressPhase::ExtractingLocations,
                    format!("Found {} potential locations", total),
                    40.0,
                )
                .with_total_items(total),
        )?;

        if candidates.is_empty() {
            return Ok(ArticleResult {
                article_title: title,
                article_text: text,
                locations: Vec::new(),
                processing_time: started.elapsed().as_secs_f64(),
                warnings,
            });
        }

        // Resolution fan-out
        session.emit(
            session
                .event(
                    ProgressPhase::ProcessingLocations,
                    format!(
                        "Processing {} locations (geocoding + generating summaries)...",
                        total
                    ),
                    50.0,
                )
                .with_total_items(total),
        )?;

        let mut output = PipelineOutput::default();
        {
            let outcomes = self.pipeline.outcomes(candidates, &text);
            futures::pin_mut!(outcomes);

            let mut finished = 0;
            while let Some(outcome) = guarded(&token, outcomes.next()).await? {
                finished += 1;
                let percent = 50.0 + 30.0 * finished as f64 / total as f64;
                session.emit(
                    session
                        .event(
                            ProgressPhase::ProcessingLocations,
                            format!("Processed {} of {} locations", finished, total),
                            percent,
                        )
                        .with_current_item(outcome.name())
                        .with_current_index(finished)
                        .with_total_items(total),
                )?;
                output.push(outcome);
            }
        }

        // Spatial deduplication
        session.emit(session.event(
            ProgressPhase::Filtering,
            "Applying spatial filters and removing duplicates...",
            80.0,
        ))?;

        let keep = self.deduplicator.filter(&output.placements);
        let removed = output.locations.len() - keep.len();
        let locations = output
            .locations
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.binary_search(i).is_ok())
            .map(|(_, location)| location)
            .collect();

        warnings.extend(output.warnings);
        if removed > 0 {
            info!(session_id = %session_id, removed, "Broader locations filtered");
            warnings.push(Warning::spatial_hierarchy_filtered(removed));
        }

        Ok(ArticleResult {
            article_title: title,
            article_text: text,
            locations,
            processing_time: started.elapsed().as_secs_f64(),
            warnings,
        })
    }
}

/// Await `fut` unless the job is cancelled first
async fn guarded<F: Future>(token: &CancellationToken, fut: F) -> Result<F::Output, JobError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(JobError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Cut `text` to at most `limit` characters; reports whether anything was cut
pub fn truncate_chars(text: String, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => {
            let mut text = text;
            text.truncate(byte_index);
            (text, true)
        }
        None => (text, false),
    }
}

fn preview(input: &str) -> String {
    match input.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_index, _)) => format!("{}...", &input[..byte_index]),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_exact_limit() {
        let (text, truncated) = truncate_chars("a".repeat(60_000), MAX_TEXT_CHARS);
        assert!(truncated);
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);

        let (text, truncated) = truncate_chars("a".repeat(MAX_TEXT_CHARS), MAX_TEXT_CHARS);
        assert!(!truncated);
        assert_eq!(text.len(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let (text, truncated) = truncate_chars("ü".repeat(10), 4);
        assert!(truncated);
        assert_eq!(text, "üüüü");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(150);
        let p = preview(&long);
        assert_eq!(p.len(), 103);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn test_error_codes() {
        let e = JobError::RateLimited { retry_after_secs: 60 };
        assert_eq!(e.code(), FailureCode::RateLimitExceeded);
        assert_eq!(e.to_failure().retry_after_secs, Some(60));
        assert_eq!(JobError::Timeout(120).code(), FailureCode::Timeout);
        assert_eq!(JobError::NoContent.to_failure().retry_after_secs, None);
    }

    #[tokio::test]
    async fn test_guarded_short_circuits_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        let result = guarded(&token, std::future::pending::<()>()).await;
        assert!(matches!(result, Err(JobError::Cancelled)));
    }
}
