//! Provider catalog file loading
//!
//! The catalog is a YAML or JSON document with a top-level `providers` list,
//! the same shape the `/providers` endpoint returns.

use std::path::Path;

use voice_console_core::ProviderCatalog;

use crate::ConfigError;

/// Load a provider catalog, choosing the parser by file extension
pub fn load_catalog(path: impl AsRef<Path>) -> Result<ProviderCatalog, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

    let catalog = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str::<ProviderCatalog>(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str::<ProviderCatalog>(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
        other => {
            return Err(ConfigError::InvalidValue {
                field: "catalog.path".to_string(),
                message: format!("Unsupported catalog format: {:?}", other),
            })
        }
    };

    tracing::info!(
        path = %path.display(),
        providers = catalog.providers().len(),
        "Loaded provider catalog"
    );

    Ok(catalog)
}
