//! Chat channel against a local websocket agent

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use uuid::Uuid;

use voice_console_client::{chat_url, ChatChannel, ChatEvent, ChatFrame, Transcript};

async fn agent(
    ws: WebSocketUpgrade,
    Path(agent_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let user = params.get("user_id").cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| reply(socket, agent_id, user))
}

/// Answers every frame with a streamed two-chunk reply
async fn reply(mut socket: WebSocket, agent_id: Uuid, user: String) {
    while let Some(Ok(Message::Text(text))) = socket.recv().await {
        let frame: ChatFrame = serde_json::from_str(&text).unwrap();
        let chunks = [
            "<beginning_of_stream>".to_string(),
            format!("[{}] ", &agent_id.to_string()[..8]),
            format!("{} said: {}", user, frame.data),
            "<end_of_stream>".to_string(),
        ];
        for chunk in chunks {
            if socket.send(Message::Text(chunk)).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_round_trip_through_transcript() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/chat/v1/:agent_id", get(agent));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let agent_id = Uuid::new_v4();
    let url = chat_url(&format!("ws://{}", addr), agent_id, "alice", "org-1").unwrap();
    let mut channel = ChatChannel::connect(&url).await.unwrap();
    let mut transcript = Transcript::new();

    transcript.push_user("hello");
    channel.send("hello").await.unwrap();
    assert!(transcript.is_typing());

    loop {
        let event = channel.next_event().await.unwrap().unwrap();
        let done = event == ChatEvent::EndOfStream;
        transcript.apply(event);
        if done {
            break;
        }
    }

    let messages = transcript.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1].text,
        format!("[{}] alice said: hello", &agent_id.to_string()[..8])
    );
    assert!(!transcript.is_streaming());

    channel.close().await.unwrap();
}
