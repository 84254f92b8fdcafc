//! Data models for the location service

pub mod candidate;
pub mod placement;
pub mod request;
pub mod resolved;
pub mod session;

pub use candidate::{ConfidenceTier, LocationCandidate, UnknownConfidenceTier};
pub use placement::{BoundingBox, GeographicPlacement};
pub use request::{parse_input, ArticleInput, ExtractRequest, InputError};
pub use resolved::{
    ArticleResult, ResolutionMethod, ResolvedLocation, Warning, WarningCode, FALLBACK_SUMMARY,
};
pub use session::{FailureCode, JobFailure, PullResult, Session, SessionOutcome};
