mod loader;
mod types;
mod validate;

use thiserror::Error;

pub use loader::{load_config, load_config_from_str};
pub use types::{Config, DatabaseConfig, ServerConfig, StorageConfig};
pub use validate::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}
