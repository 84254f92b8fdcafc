//! Session progress tracking

pub mod broadcaster;
pub mod registry;

pub use broadcaster::{ProgressBroadcaster, ProgressError, Subscription};
pub use registry::SessionRegistry;
