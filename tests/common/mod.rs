#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use prompt_relay::api::types::{ClientEvent, ServerEvent};
use prompt_relay::api::{router, AppState};
use prompt_relay::llm::{ChatMessage, LlmClient, LlmError};
use prompt_relay::Config;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Replies `echo: <user text>`; prompts containing "slow" take a while,
/// "stall" takes 2 s, and prompts containing "fail" get a 503.
pub struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if user.contains("stall") {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        if user.contains("slow") {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        if user.contains("fail") {
            return Err(LlmError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        Ok(format!("echo: {}", user))
    }
}

pub fn test_config(dir: &Path) -> Config {
    Config::new(
        "sk-or-test".to_string(),
        "test/model".to_string(),
        dir.to_path_buf(),
    )
}

/// Serve `router` on an ephemeral port.
pub async fn spawn(app: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn spawn_relay(config: Config, llm: Arc<dyn LlmClient>) -> SocketAddr {
    spawn(router(Arc::new(AppState::new(config, llm)))).await
}

pub async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    socket
}

pub async fn send(socket: &mut Socket, event: &ClientEvent) {
    let json = serde_json::to_string(event).unwrap();
    socket.send(Message::Text(json)).await.unwrap();
}

pub async fn send_raw(socket: &mut Socket, frame: &str) {
    socket.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next server event, or `None` if nothing arrives within `wait`.
pub async fn recv_within(socket: &mut Socket, wait: Duration) -> Option<ServerEvent> {
    loop {
        let frame = tokio::time::timeout(wait, socket.next()).await.ok()??;
        match frame.ok()? {
            Message::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

pub async fn recv(socket: &mut Socket) -> ServerEvent {
    recv_within(socket, Duration::from_secs(5))
        .await
        .expect("expected a server event")
}
