//! REST handlers
//!
//! Every handler answers with the `{success, data, message, error}`
//! envelope; failures go through [`ServerError`](crate::ServerError).

pub mod account;
pub mod agents;
pub mod catalog;
pub mod drafts;
pub mod records;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use serde::de::DeserializeOwned;
use url::form_urlencoded;
use uuid::Uuid;

use voice_console_core::{ApiResponse, Error as CoreError};
use voice_console_editor::FilterState;

use crate::Result;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

pub fn ok_with_message<T>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok_with_message(data, message)))
}

/// Unwrap a JSON body, reporting a malformed one as a validation error
pub fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| CoreError::invalid("(body)", rejection.body_text()).into())
}

/// Parse a JSON body that may be left empty; an empty one means defaults
pub fn optional_body<T: DeserializeOwned + Default>(raw: &[u8]) -> Result<T> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(raw).map_err(|e| CoreError::invalid("(body)", e.to_string()).into())
}

/// Unwrap typed query parameters, reporting bad ones as a validation error
pub fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| CoreError::invalid("(query)", rejection.body_text()).into())
}

/// List filters plus an optional `agent_id`, from a raw query string
///
/// Keys missing from the query take their value from `defaults`.
pub fn list_query(
    query: Option<&str>,
    defaults: FilterState,
) -> Result<(FilterState, Option<Uuid>)> {
    let query = query.unwrap_or_default();
    let filter = FilterState::from_query_string_with(query, defaults);
    let agent_id = form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "agent_id")
        .map(|(_, value)| {
            Uuid::parse_str(&value)
                .map_err(|_| CoreError::invalid("agent_id", "Must be a UUID"))
        })
        .transpose()?;
    Ok((filter, agent_id))
}
