//! Provider catalog, vendor credentials and voices

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use voice_console_core::provider::{Provider, ProviderCategory};
use voice_console_core::resources::{ConnectProviderRequest, ProviderCredential, Voice};

use super::{body, ok, ok_with_message, query, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProvidersQuery {
    #[serde(default)]
    pub category: Option<ProviderCategory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoicesQuery {
    #[serde(default)]
    pub provider: Option<String>,
}

/// GET /providers
///
/// `connected` reflects the credentials stored at the time of the call.
pub async fn list_providers(
    State(state): State<AppState>,
    params: Result<Query<ProvidersQuery>, QueryRejection>,
) -> ApiResult<Vec<Provider>> {
    let params = query(params)?;
    let catalog = state.store.with_connections(&state.catalog.read());
    let providers = catalog
        .providers()
        .iter()
        .filter(|p| params.category.map_or(true, |c| p.category == c))
        .cloned()
        .collect();
    ok(providers)
}

/// GET /providers/credentials
pub async fn list_credentials(State(state): State<AppState>) -> ApiResult<Vec<ProviderCredential>> {
    ok(state.store.credentials())
}

/// POST /providers/credentials
pub async fn connect_provider(
    State(state): State<AppState>,
    request: Result<Json<ConnectProviderRequest>, JsonRejection>,
) -> ApiResult<ProviderCredential> {
    let request = body(request)?;
    let credential = state
        .store
        .connect_provider(&request.provider_name, &request.provider_value)?;
    ok_with_message(credential, "Provider connected")
}

/// DELETE /providers/credentials/:provider_name
pub async fn disconnect_provider(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
) -> ApiResult<String> {
    state.store.disconnect_provider(&provider_name)?;
    tracing::info!(provider = %provider_name, "Provider disconnected");
    ok_with_message(provider_name, "Provider disconnected")
}

/// GET /voices
pub async fn list_voices(
    State(state): State<AppState>,
    params: Result<Query<VoicesQuery>, QueryRejection>,
) -> ApiResult<Vec<Voice>> {
    let params = query(params)?;
    ok(state.store.voices(params.provider.as_deref()))
}
