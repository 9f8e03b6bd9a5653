//! Client side of the voice agent backend
//!
//! Features:
//! - Typed REST client with envelope parsing and bearer auth
//! - Agent detail loading that tolerates partial failure
//! - Chat channel (frame codec, stream sentinels, typing transcript)

pub mod chat;
pub mod client;
pub mod detail;

pub use chat::{chat_url, ChatChannel, ChatEvent, ChatFrame, ChatMessage, ChatRole, Transcript};
pub use client::ConsoleClient;
pub use detail::{load_agent_detail, AgentDetail};

use thiserror::Error;
use voice_console_core::Error as CoreError;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failure reported by the backend (or classified from its status)
    #[error(transparent)]
    Api(#[from] CoreError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(err.to_string())
    }
}

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api(inner) => inner,
            ClientError::Network(msg) | ClientError::WebSocket(msg) => CoreError::Network(msg),
            ClientError::InvalidResponse(msg) => CoreError::Serialization(msg),
            other => CoreError::Server(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
