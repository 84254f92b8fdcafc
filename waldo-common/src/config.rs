//! Bootstrap configuration loading
//!
//! Settings are resolved with the following priority:
//! 1. Command-line arguments (applied by the binary after loading)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "WALDO_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Every field has a built-in default, so an empty file (or no file at all)
/// yields a runnable configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Interface the HTTP server binds to
    pub bind_address: String,

    /// HTTP server port
    pub port: u16,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Gemini API key used for candidate extraction and summaries
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    pub gemini_model: String,

    /// Base URL of the Nominatim geocoding service
    pub nominatim_url: String,

    /// Outbound geocoding request budget (process-wide)
    pub geocoder_requests_per_second: u32,

    /// Hard limit on one job's wall-clock time
    pub job_timeout_secs: u64,

    /// How long a finished session stays retrievable
    pub session_retention_secs: u64,

    /// Idle interval between progress stream heartbeats
    pub heartbeat_interval_ms: u64,

    /// Delay between the terminal event and closing a progress stream
    pub stream_close_grace_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5780,
            logging: LoggingConfig::default(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_requests_per_second: 1,
            job_timeout_secs: 120,
            session_retention_secs: 300,
            heartbeat_interval_ms: 500,
            stream_close_grace_ms: 1000,
        }
    }
}

impl TomlConfig {
    /// Load configuration: locate the TOML file, parse it, then apply
    /// environment overrides and validate.
    ///
    /// `cli_path` wins over `WALDO_CONFIG`, which wins over the per-user
    /// default location. A missing default file is not an error.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                debug!("No config file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables onto file/default values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("WALDO_BIND_ADDRESS") {
            self.bind_address = addr;
        }

        if let Ok(port) = std::env::var("WALDO_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring unparseable WALDO_PORT value: {}", port),
            }
        }

        // Service-specific name wins over the generic one
        let env_key = std::env::var("WALDO_GEMINI_API_KEY")
            .ok()
            .filter(|k| is_valid_key(k))
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| is_valid_key(k)));
        if let Some(key) = env_key {
            if self.gemini_api_key.as_deref().is_some_and(is_valid_key) {
                warn!("Gemini API key found in both TOML and environment. Using environment.");
            }
            self.gemini_api_key = Some(key);
        }

        if let Ok(model) = std::env::var("WALDO_GEMINI_MODEL") {
            self.gemini_model = model;
        }

        if let Ok(url) = std::env::var("WALDO_NOMINATIM_URL") {
            self.nominatim_url = url;
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.geocoder_requests_per_second == 0 {
            return Err(Error::Config(
                "geocoder_requests_per_second must be at least 1".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(Error::Config(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.job_timeout_secs == 0 {
            return Err(Error::Config(
                "job_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.nominatim_url.trim().is_empty() {
            return Err(Error::Config("nominatim_url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Gemini key if one is configured and non-blank
    pub fn gemini_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref().filter(|k| is_valid_key(k))
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// Locate the config file to load, if any
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Per-user default config location (`~/.config/waldo/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("waldo").join("config.toml"))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
