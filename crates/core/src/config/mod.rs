//! Service configuration: TOML file with environment overrides.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    Config, DatabaseConfig, DownloaderConfig, LibraryConfig, SanitizedConfig, ServerConfig,
};
pub use validate::validate_config;

use thiserror::Error;

/// Errors for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}
