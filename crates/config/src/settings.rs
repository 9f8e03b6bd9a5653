//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::constants::{auth, endpoints, listing, timeouts};
use crate::ConfigError;

/// Prefix of environment overrides (`VOICE_CONSOLE__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "VOICE_CONSOLE";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP service
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote backend used by the client
    #[serde(default)]
    pub backend: BackendConfig,

    /// Provider catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// List/search behaviour
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_backend()?;
        self.validate_editor()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.auth.session_ttl_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.session_ttl_hours".to_string(),
                message: "Sessions must last at least 1 hour".to_string(),
            });
        }

        if self.environment.is_production() && server.auth.enabled && server.auth.api_key.is_none()
        {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "API key must be set when auth is enabled in production".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 All cross-origin requests will be rejected."
            );
        }

        Ok(())
    }

    fn validate_backend(&self) -> Result<(), ConfigError> {
        let backend = &self.backend;

        check_url("backend.base_url", &backend.base_url, &["http", "https"])?;
        check_url("backend.ws_url", &backend.ws_url, &["ws", "wss"])?;

        if backend.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_editor(&self) -> Result<(), ConfigError> {
        let editor = &self.editor;

        let debounce = listing::MIN_SEARCH_DEBOUNCE_MS..=listing::MAX_SEARCH_DEBOUNCE_MS;
        if !debounce.contains(&editor.search_debounce_ms) {
            return Err(ConfigError::InvalidValue {
                field: "editor.search_debounce_ms".to_string(),
                message: format!(
                    "Must be between {} and {}, got {}",
                    listing::MIN_SEARCH_DEBOUNCE_MS,
                    listing::MAX_SEARCH_DEBOUNCE_MS,
                    editor.search_debounce_ms
                ),
            });
        }

        if editor.page_size == 0 || editor.page_size > listing::MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "editor.page_size".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    listing::MAX_PAGE_SIZE,
                    editor.page_size
                ),
            });
        }

        Ok(())
    }
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("Invalid URL '{}': {}", value, e),
    })?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!(
                "Scheme must be one of {:?}, got '{}'",
                schemes,
                parsed.scheme()
            ),
        });
    }
    Ok(())
}

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    endpoints::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    endpoints::DEFAULT_PORT
}

fn default_timeout() -> u64 {
    timeouts::REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Disabled by default for development
    #[serde(default)]
    pub enabled: bool,

    /// Static API key accepted in addition to session tokens
    /// (set via VOICE_CONSOLE__SERVER__AUTH__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Hours a login session stays valid
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
}

fn default_session_ttl_hours() -> u64 {
    auth::SESSION_TTL_HOURS
}

fn default_public_paths() -> Vec<String> {
    auth::DEFAULT_PUBLIC_PATHS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 3600)
    }
}

/// Remote backend used by the REST client and chat channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,

    /// Bearer token for requests that need one
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_backend_url() -> String {
    endpoints::DEFAULT_BACKEND_URL.to_string()
}

fn default_ws_url() -> String {
    endpoints::DEFAULT_WS_URL.to_string()
}

fn default_backend_timeout() -> u64 {
    timeouts::BACKEND_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            ws_url: default_ws_url(),
            timeout_seconds: default_backend_timeout(),
            access_token: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Provider catalog file (YAML or JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String {
    "config/providers.yaml".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// List and search behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_search_debounce_ms() -> u64 {
    listing::SEARCH_DEBOUNCE_MS
}

fn default_page_size() -> usize {
    listing::DEFAULT_PAGE_SIZE
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

impl EditorConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a config directory
///
/// Sources, lowest priority first: `{dir}/default.*`, `{dir}/{env}.*`,
/// then `VOICE_CONSOLE__*` environment variables.
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder =
            builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.auth.enabled);
        assert_eq!(settings.editor.page_size, listing::DEFAULT_PAGE_SIZE);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_port_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_backend_url_validation() {
        let mut settings = Settings::default();
        settings.backend.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());

        settings.backend.base_url = "https://api.example.com".to_string();
        settings.backend.ws_url = "https://api.example.com".to_string();
        match settings.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "backend.ws_url"),
            other => panic!("unexpected: {:?}", other),
        }

        settings.backend.ws_url = "wss://api.example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debounce_bounds() {
        let mut settings = Settings::default();
        settings.editor.search_debounce_ms = 10;
        assert!(settings.validate().is_err());
        settings.editor.search_debounce_ms = 300;
        settings.editor.page_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_requires_api_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.server.auth.enabled = true;
        assert!(settings.validate().is_err());

        settings.server.auth.api_key = Some("secret".to_string());
        assert!(settings.validate().is_ok());

        settings.server.auth.session_ttl_hours = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_layers_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.yaml"),
            "server:\n  port: 9000\neditor:\n  page_size: 50\n",
        )
        .unwrap();
        fs::write(dir.path().join("staging.yaml"), "server:\n  port: 9100\n").unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.editor.page_size, 50);

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.editor.page_size, 50);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.yaml"), "server:\n  port: 0\n").unwrap();
        assert!(matches!(
            load_settings_from(dir.path(), None),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_dir_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("absent"), None).unwrap();
        assert_eq!(settings.server.port, endpoints::DEFAULT_PORT);
    }
}
