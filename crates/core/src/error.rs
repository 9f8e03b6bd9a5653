//! Error types
//!
//! Every failure the console can surface falls into one of the categories of
//! [`ErrorKind`]. Validation failures carry field-level issues so that callers
//! can map them back onto individual form fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single field-level validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `routes[0].score_threshold`)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error category, serialized with its wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Client-side schema violation
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// 401/403
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    /// 404
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Stale write rejected by version check
    #[serde(rename = "CONFLICT")]
    Conflict,
    /// Anything else
    #[serde(rename = "SERVER_ERROR")]
    Server,
}

impl ErrorKind {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Server => "SERVER_ERROR",
        }
    }

    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            409 => Self::Conflict,
            _ => Self::Server,
        }
    }

    /// HTTP status used when this kind is returned by the service
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation => 422,
            Self::Auth => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Server => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Console errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<FieldError>),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join_issues(issues: &[FieldError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Server(_) | Error::Network(_) | Error::Serialization(_) => ErrorKind::Server,
        }
    }

    /// Build an error of the given kind from a message
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>, issues: Vec<FieldError>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Validation if !issues.is_empty() => Error::Validation(issues),
            ErrorKind::Validation => Error::Validation(vec![FieldError::new("(root)", message)]),
            ErrorKind::Auth => Error::Auth(message),
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::Conflict => Error::Conflict(message),
            ErrorKind::Server => Error::Server(message),
        }
    }

    /// Field issues, empty for non-validation errors
    pub fn issues(&self) -> &[FieldError] {
        match self {
            Error::Validation(issues) => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
