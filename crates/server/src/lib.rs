//! Voice Console Server
//!
//! HTTP service for the voice agent console: agents with optimistic
//! versioning, edit-session drafts, cost estimates and the supporting
//! resources (executions, knowledge bases, numbers, providers, keys,
//! organizations, users).

pub mod api;
pub mod auth;
pub mod credentials;
pub mod http;
pub mod metrics;
pub mod state;
pub mod store;

pub use auth::{auth_middleware, CurrentUser};
pub use http::create_router;
pub use metrics::{init_metrics, record_agent_save, record_request, record_save_conflict};
pub use state::AppState;
pub use store::ConsoleStore;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use voice_console_config::ConfigError;
use voice_console_core::{ApiResponse, Error as CoreError};
use voice_console_editor::EditorError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Api(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EditorError> for ServerError {
    fn from(err: EditorError) -> Self {
        ServerError::Api(err.into())
    }
}

impl ServerError {
    /// Error as reported to API clients
    pub fn into_api_error(self) -> CoreError {
        match self {
            ServerError::Api(err) => err,
            other => CoreError::Server(other.to_string()),
        }
    }
}

/// Response for an API error, wrapped in the failure envelope
pub fn error_response(err: &CoreError) -> Response {
    let status =
        StatusCode::from_u16(err.kind().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(ApiResponse::<()>::failure(err))).into_response()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error_response(&self.into_api_error())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
