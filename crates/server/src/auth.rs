//! Authentication Middleware
//!
//! Accepts the token from `Authorization: Bearer <token>` or from the
//! `access_token` cookie. A token is valid when it is a live session, a
//! stored API key, or the static key from configuration.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicBool, Ordering};

use voice_console_config::constants::auth::ACCESS_TOKEN_COOKIE;
use voice_console_core::resources::User;
use voice_console_core::Error as CoreError;

use crate::credentials::constant_time_compare;
use crate::error_response;
use crate::state::AppState;

/// Track if we've warned about auth being disabled (warn once only)
static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

/// Session user resolved from the request token, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// Authentication result after checking config
enum AuthCheck {
    /// Authentication disabled, pass through
    Disabled,
    /// Path is public, pass through
    PublicPath,
    /// Token required; static key accepted in addition to sessions
    Required { static_key: Option<String> },
}

/// Check auth config and return what action to take
///
/// Extracts all needed config values synchronously so the lock guard is
/// never held across an await point.
fn check_auth_config(state: &AppState, path: &str) -> AuthCheck {
    let config = state.config.read();
    let auth = &config.server.auth;

    if !auth.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is DISABLED! Set VOICE_CONSOLE__SERVER__AUTH__ENABLED=true for production."
            );
        }
        return AuthCheck::Disabled;
    }

    if auth.public_paths.iter().any(|p| path == p || path.starts_with(&format!("{}/", p))) {
        return AuthCheck::PublicPath;
    }

    AuthCheck::Required {
        static_key: auth.api_key.clone().filter(|k| !k.is_empty()),
    }
}

/// Token from the Authorization header, falling back to the cookie
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// - Resolves the session user (if any) into a [`CurrentUser`] extension
/// - Skips the token check for public paths and when auth is disabled
/// - Returns 401 with an `AUTH_ERROR` envelope otherwise
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request_token(request.headers());
    let user = token.as_deref().and_then(|t| state.store.session_user(t));
    let path = request.uri().path().to_string();
    let check = check_auth_config(&state, &path);

    let authorized = match check {
        AuthCheck::Disabled | AuthCheck::PublicPath => true,
        AuthCheck::Required { static_key } => match token.as_deref() {
            None => {
                return error_response(&CoreError::Auth(
                    "Missing access token".to_string(),
                ))
            }
            Some(token) => {
                user.is_some()
                    || static_key
                        .as_deref()
                        .is_some_and(|k| constant_time_compare(token.as_bytes(), k.as_bytes()))
                    || state.store.is_valid_api_key(token)
            }
        },
    };

    if !authorized {
        tracing::warn!(
            path = %path,
            forwarded_for = ?request.headers().get("X-Forwarded-For"),
            "Rejected invalid access token"
        );
        return error_response(&CoreError::Auth("Invalid access token".to_string()));
    }

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
