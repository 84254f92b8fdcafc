//! # Waldo Common Library
//!
//! Shared code for the waldo services:
//! - Error type
//! - Bootstrap configuration loading (TOML, environment, defaults)
//! - Progress event vocabulary shared by the job and its observers
//! - Server-Sent Events framing helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
