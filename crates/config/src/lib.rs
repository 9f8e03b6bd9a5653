//! Configuration management for the voice console
//!
//! Supports loading configuration from:
//! - YAML/JSON files under `config/` (`default`, then `{env}`)
//! - Environment variables (`VOICE_CONSOLE__` prefix, `__` separator)
//!
//! The provider catalog is a separate YAML/JSON file, see [`load_catalog`].

pub mod catalog;
pub mod constants;
pub mod settings;

pub use catalog::load_catalog;
pub use settings::{
    load_settings, load_settings_from, AuthConfig, BackendConfig, CatalogConfig, EditorConfig,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, ENV_PREFIX,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
