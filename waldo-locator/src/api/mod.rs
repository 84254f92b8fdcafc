//! HTTP API handlers for waldo-locator
//!
//! REST endpoints for submission, result pull, and cancellation, plus an
//! SSE stream per session.

pub mod extract;
pub mod health;
pub mod sse;

pub use extract::extract_routes;
pub use health::health_routes;
pub use sse::progress_routes;
