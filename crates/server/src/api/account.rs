//! Users, API keys and organizations

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use uuid::Uuid;

use voice_console_core::resources::{
    ApiKey, AuthSession, CreateApiKeyRequest, CreateOrganizationRequest, CreatedApiKey, LoginRequest,
    Organization, SignupRequest, User,
};
use voice_console_core::Error as CoreError;

use super::{body, ok, ok_with_message, ApiResult};
use crate::auth::{request_token, CurrentUser};
use crate::state::AppState;

/// POST /user/signup
pub async fn signup(
    State(state): State<AppState>,
    request: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let request = body(request)?;
    let (access_token, user) = state.store.signup(&request)?;
    ok_with_message(AuthSession { access_token, user }, "Account created")
}

/// POST /user/login
pub async fn login(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let request = body(request)?;
    let (access_token, user) = state.store.login(&request)?;
    tracing::info!(user_id = %user.id, "User logged in");
    ok(AuthSession { access_token, user })
}

/// GET /user/me
///
/// Only session tokens identify a user; API keys authenticate without one.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<User> {
    match user {
        Some(user) => ok(user),
        None => Err(CoreError::Auth("No user session".to_string()).into()),
    }
}

/// POST /user/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Uuid> {
    let token = request_token(&headers);
    let user = token.as_deref().and_then(|t| state.store.session_user(t));
    match (token, user) {
        (Some(token), Some(user)) => {
            state.store.logout(&token);
            tracing::info!(user_id = %user.id, "User logged out");
            ok_with_message(user.id, "Logged out")
        }
        _ => Err(CoreError::Auth("No user session".to_string()).into()),
    }
}

/// GET /api-keys
pub async fn list_api_keys(State(state): State<AppState>) -> ApiResult<Vec<ApiKey>> {
    ok(state.store.api_keys())
}

/// POST /api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    request: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> ApiResult<CreatedApiKey> {
    let request = body(request)?;
    ok_with_message(
        state.store.create_api_key(&request.name)?,
        "Copy the key now; it will not be shown again",
    )
}

/// DELETE /api-keys/:id
pub async fn delete_api_key(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    state.store.delete_api_key(id)?;
    ok_with_message(id, "API key deleted")
}

/// GET /organizations/all
pub async fn list_organizations(State(state): State<AppState>) -> ApiResult<Vec<Organization>> {
    ok(state.store.organizations())
}

/// POST /organizations
pub async fn create_organization(
    State(state): State<AppState>,
    request: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> ApiResult<Organization> {
    let request = body(request)?;
    ok_with_message(
        state.store.create_organization(&request.name)?,
        "Organization created",
    )
}

/// GET /organizations/active
pub async fn active_organization(State(state): State<AppState>) -> ApiResult<Organization> {
    ok(state.store.active_organization()?)
}

/// POST /organizations/:id/activate
pub async fn activate_organization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Organization> {
    ok_with_message(state.store.activate_organization(id)?, "Organization activated")
}
