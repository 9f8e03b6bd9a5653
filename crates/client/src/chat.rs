//! Chat channel for testing an agent by text
//!
//! The client opens `{ws}/chat/v1/{agent_id}?user_id=..&org_id=..`, sends
//! `{data, type, timestamp}` text frames and receives either stream
//! sentinels or plain text chunks. While a reply is pending the transcript
//! shows a typing placeholder that the first chunk replaces.

use chrono::{DateTime, Utc};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;
use uuid::Uuid;

use voice_console_config::constants::{chat, endpoints};

use crate::{ClientError, Result};

/// Channel URL for an agent
pub fn chat_url(ws_base: &str, agent_id: Uuid, user_id: &str, org_id: &str) -> Result<Url> {
    let mut url = Url::parse(ws_base)?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ClientError::Configuration(format!(
            "chat channel needs a ws:// or wss:// URL, got {}",
            ws_base
        )));
    }
    let path = format!(
        "{}{}/{}",
        url.path().trim_end_matches('/'),
        endpoints::CHAT_PATH,
        agent_id
    );
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("user_id", user_id)
        .append_pair("org_id", org_id);
    Ok(url)
}

/// Outgoing frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatFrame {
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: "text".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Incoming payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    BeginningOfStream,
    EndOfStream,
    Text(String),
}

impl ChatEvent {
    pub fn parse(payload: &str) -> Self {
        match payload.trim() {
            chat::BEGINNING_OF_STREAM => ChatEvent::BeginningOfStream,
            chat::END_OF_STREAM => ChatEvent::EndOfStream,
            _ => ChatEvent::Text(payload.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    fn is_placeholder(&self) -> bool {
        self.role == ChatRole::Agent && self.text == chat::TYPING_PLACEHOLDER
    }
}

/// Conversation as shown in the chat panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    streaming: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// A reply is pending and nothing of it has arrived yet
    pub fn is_typing(&self) -> bool {
        self.messages.last().is_some_and(ChatMessage::is_placeholder)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Record a user message and show the typing placeholder
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: text.into(),
        });
        self.push_placeholder();
    }

    fn push_placeholder(&mut self) {
        if !self.is_typing() {
            self.messages.push(ChatMessage {
                role: ChatRole::Agent,
                text: chat::TYPING_PLACEHOLDER.to_string(),
            });
        }
    }

    /// Fold an incoming event into the transcript
    pub fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::BeginningOfStream => {
                self.streaming = true;
                self.push_placeholder();
            }
            ChatEvent::EndOfStream => {
                self.streaming = false;
                if self.is_typing() {
                    self.messages.pop();
                }
            }
            ChatEvent::Text(chunk) => {
                if self.is_typing() {
                    if let Some(last) = self.messages.last_mut() {
                        last.text = chunk;
                    }
                } else if self.streaming
                    && self.messages.last().is_some_and(|m| m.role == ChatRole::Agent)
                {
                    if let Some(last) = self.messages.last_mut() {
                        last.text.push_str(&chunk);
                    }
                } else {
                    self.messages.push(ChatMessage {
                        role: ChatRole::Agent,
                        text: chunk,
                    });
                }
            }
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open websocket connection to an agent
pub struct ChatChannel {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl ChatChannel {
    pub async fn connect(url: &Url) -> Result<Self> {
        let (socket, _) = connect_async(url.as_str()).await?;
        tracing::info!(url = %url, "Chat channel connected");
        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    pub async fn send(&mut self, text: &str) -> Result<()> {
        let frame = serde_json::to_string(&ChatFrame::text(text))
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        self.sink.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Next event; `None` once the server closed the channel
    pub async fn next_event(&mut self) -> Option<Result<ChatEvent>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(ChatEvent::parse(&text))),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(ChatEvent::parse(&String::from_utf8_lossy(&bytes))))
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<()> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }
}
