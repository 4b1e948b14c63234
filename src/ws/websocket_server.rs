use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::breath::breath::{Phase, Snapshot};
use crate::breath::pacer::Pacer;

/// Control message sent by a browser front end, e.g. `{"command":"start"}`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ClientCommand {
    Start,
    Stop,
    Toggle,
}

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub running: bool,
    pub phase: Phase,
    pub remaining: u32,
    pub cycles: u64,
    pub text: &'static str,
}

impl From<Snapshot> for SnapshotMessage {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            msg_type: "snapshot",
            running: snapshot.running,
            phase: snapshot.phase,
            remaining: snapshot.remaining,
            cycles: snapshot.cycles,
            text: snapshot.phase.text(),
        }
    }
}

pub async fn start_websocket_server(
    addr: SocketAddr,
    pacer: Arc<Pacer>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket server listening on: {}", addr);
    serve(listener, pacer).await;
    Ok(())
}

pub async fn serve(listener: TcpListener, pacer: Arc<Pacer>) {
    while let Ok((stream, peer_addr)) = listener.accept().await {
        tracing::info!("New WebSocket connection from: {}", peer_addr);
        tokio::spawn(handle_connection(stream, peer_addr, Arc::clone(&pacer)));
    }
}

/// Apply one text frame to the pacer and build the reply.
pub fn handle_text(pacer: &Pacer, text: &str) -> WebSocketResponse {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => {
            tracing::debug!(?command, "received command");
            let message = match command {
                ClientCommand::Start => {
                    pacer.start();
                    "Started"
                }
                ClientCommand::Stop => {
                    pacer.stop();
                    "Stopped"
                }
                ClientCommand::Toggle => {
                    if pacer.toggle() {
                        "Started"
                    } else {
                        "Stopped"
                    }
                }
            };
            WebSocketResponse {
                success: true,
                message: Some(message.to_string()),
            }
        }
        Err(e) => {
            tracing::warn!("Failed to parse message: {}", e);
            WebSocketResponse {
                success: false,
                message: Some(format!("Parse error: {}", e)),
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, pacer: Arc<Pacer>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    tracing::debug!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut snapshots = pacer.subscribe();

    let initial = *snapshots.borrow_and_update();
    if let Ok(json) = serde_json::to_string(&SnapshotMessage::from(initial)) {
        if ws_sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *snapshots.borrow_and_update();
                if let Ok(json) = serde_json::to_string(&SnapshotMessage::from(snapshot)) {
                    if let Err(e) = ws_sender.send(Message::Text(json)).await {
                        tracing::warn!("Failed to push snapshot to {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text(&pacer, &text);
                        if let Ok(response_json) = serde_json::to_string(&response) {
                            if let Err(e) = ws_sender.send(Message::Text(response_json)).await {
                                tracing::warn!("Failed to send WebSocket response: {}", e);
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("WebSocket connection closed by {}", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            tracing::warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("WebSocket connection with {} terminated", peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breath::breath::Pattern;

    #[test]
    fn test_response_serialization() {
        let response = WebSocketResponse {
            success: true,
            message: Some("Started".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"Started\""));
    }

    #[test]
    fn test_snapshot_message_shape() {
        let message = SnapshotMessage::from(Snapshot {
            running: true,
            phase: Phase::Hold,
            remaining: 6,
            cycles: 2,
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "snapshot");
        assert_eq!(value["phase"], "hold");
        assert_eq!(value["remaining"], 6);
        assert_eq!(value["text"], "Hold");
    }

    #[test]
    fn test_command_parsing() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"command":"toggle"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Toggle);
        assert!(serde_json::from_str::<ClientCommand>(r#"{"command":"rewind"}"#).is_err());
    }

    #[tokio::test]
    async fn test_handle_text_drives_pacer() {
        let pacer = Pacer::new(Pattern::default(), None);
        let response = handle_text(&pacer, r#"{"command":"start"}"#);
        assert!(response.success);
        assert!(pacer.is_running());

        let response = handle_text(&pacer, r#"{"command":"toggle"}"#);
        assert_eq!(response.message.as_deref(), Some("Stopped"));
        assert!(!pacer.is_running());

        let response = handle_text(&pacer, "not json");
        assert!(!response.success);
        assert!(response.message.unwrap().starts_with("Parse error"));
        assert!(!pacer.is_running());
    }

    #[tokio::test]
    async fn test_client_receives_snapshots_and_controls_pacer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let pacer = Arc::new(Pacer::new(Pattern::default(), None));
        tokio::spawn(serve(listener, Arc::clone(&pacer)));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();

        let first = client.next().await.unwrap().unwrap().into_text().unwrap();
        let first: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(first["running"], false);
        assert_eq!(first["remaining"], 4);

        client
            .send(Message::Text(r#"{"command":"start"}"#.to_string()))
            .await
            .unwrap();

        let reply = client.next().await.unwrap().unwrap().into_text().unwrap();
        let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["success"], true);

        let pushed = client.next().await.unwrap().unwrap().into_text().unwrap();
        let pushed: serde_json::Value = serde_json::from_str(&pushed).unwrap();
        assert_eq!(pushed["running"], true);
        assert_eq!(pushed["phase"], "inhale");

        pacer.stop();
    }
}
