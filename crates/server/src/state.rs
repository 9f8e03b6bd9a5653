//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use std::sync::Arc;

use voice_console_config::{load_catalog, load_settings, Settings};
use voice_console_core::ProviderCatalog;
use voice_console_editor::FilterState;

use crate::store::ConsoleStore;
use crate::Result;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for hot-reload support
    pub config: Arc<RwLock<Settings>>,
    /// Provider catalog used for listings and cost estimates
    pub catalog: Arc<RwLock<ProviderCatalog>>,
    pub store: Arc<ConsoleStore>,
    /// Prometheus render handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    pub fn new(config: Settings, catalog: ProviderCatalog) -> Self {
        let store = ConsoleStore::new().with_session_ttl(config.server.auth.session_ttl());
        Self {
            config: Arc::new(RwLock::new(config)),
            catalog: Arc::new(RwLock::new(catalog)),
            store: Arc::new(store),
            metrics: None,
            env: None,
        }
    }

    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    pub fn with_store(mut self, store: Arc<ConsoleStore>) -> Self {
        self.store = store;
        self
    }

    /// Reload settings and the provider catalog from disk
    ///
    /// Nothing is replaced unless both load; CORS stays as built at startup.
    pub fn reload_config(&self) -> Result<()> {
        let new_config = load_settings(self.env.as_deref())?;
        let new_catalog = load_catalog(&new_config.catalog.path)?;

        *self.catalog.write() = new_catalog;
        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Filter defaults for list endpoints, from the editor settings
    pub fn list_defaults(&self) -> FilterState {
        FilterState::from_config(&self.config.read().editor)
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
