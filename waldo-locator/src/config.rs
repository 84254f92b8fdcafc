//! Runtime settings for waldo-locator
//!
//! Derived once at startup from the bootstrap [`TomlConfig`]; handlers and
//! jobs only ever see these typed values.

use std::time::Duration;
use tracing::{info, warn};
use waldo_common::config::TomlConfig;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub nominatim_url: String,
    pub geocoder_requests_per_second: u32,
    pub job_timeout: Duration,
    pub session_retention: Duration,
    pub heartbeat_interval: Duration,
    pub stream_close_grace: Duration,
}

impl ServiceConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            gemini_api_key: resolve_gemini_api_key(config),
            gemini_model: config.gemini_model.clone(),
            nominatim_url: config.nominatim_url.clone(),
            geocoder_requests_per_second: config.geocoder_requests_per_second,
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            session_retention: Duration::from_secs(config.session_retention_secs),
            heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
            stream_close_grace: Duration::from_millis(config.stream_close_grace_ms),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

/// Gemini key, if any; a missing key is reported but not fatal
pub fn resolve_gemini_api_key(config: &TomlConfig) -> Option<String> {
    match config.gemini_key() {
        Some(key) => {
            info!("Gemini API key configured");
            Some(key.to_string())
        }
        None => {
            warn!("GEMINI_API_KEY not configured; every job will fail with CONFIGURATION_ERROR");
            None
        }
    }
}
