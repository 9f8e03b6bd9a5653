//! Response envelope
//!
//! Every backend response is wrapped as `{ success, data?, message?, error? }`.
//! The service emits `error` as an [`ApiErrorBody`]; third-party backends may
//! put anything there, so the raw value is kept and parsed lazily.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, FieldError, Result};

/// Envelope around every response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Structured error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: ErrorKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    /// Failure envelope for an error
    pub fn failure(err: &Error) -> Self {
        let body = ApiErrorBody {
            code: err.kind(),
            issues: err.issues().to_vec(),
        };
        Self {
            success: false,
            data: None,
            message: Some(err.to_string()),
            error: serde_json::to_value(body).ok(),
        }
    }

    /// Structured error body, if the backend sent one we understand
    pub fn error_body(&self) -> Option<ApiErrorBody> {
        self.error
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Unwrap the envelope, classifying failures by body code or HTTP status
    pub fn into_result(self, status: u16) -> Result<T> {
        if self.success {
            return self
                .data
                .ok_or_else(|| Error::Server("response envelope has no data".to_string()));
        }
        Err(self.into_error(status))
    }

    /// Unwrap an envelope whose success carries no payload
    pub fn into_unit(self, status: u16) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(self.into_error(status))
        }
    }

    fn into_error(self, status: u16) -> Error {
        let body = self.error_body();
        let kind = body
            .as_ref()
            .map(|b| b.code)
            .unwrap_or_else(|| ErrorKind::from_status(status));
        let message = self
            .message
            .unwrap_or_else(|| format!("request failed with status {}", status));
        let issues = body.map(|b| b.issues).unwrap_or_default();
        Error::from_kind(kind, message, issues)
    }
}
