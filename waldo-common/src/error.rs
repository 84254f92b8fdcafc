//! Common error types for waldo

use thiserror::Error;

/// Common result type for waldo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across waldo services
#[derive(Error, Debug)]
pub enum Error {
    /// TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
