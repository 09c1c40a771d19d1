mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use common::{connect, recv, send, spawn, spawn_relay, test_config};
use prompt_relay::api::types::{ClientEvent, MessageKind, ServerEvent};
use prompt_relay::llm::{ChatMessage, HuggingFaceClient, LlmClient, LlmError, OpenRouterClient};
use serde_json::{json, Value};

/// OpenRouter stand-in. The user text selects the behavior.
async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != "Bearer sk-or-test" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad key"}})));
    }
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");

    match body["messages"][1]["content"].as_str().unwrap_or_default() {
        "hello" => (
            StatusCode::OK,
            Json(json!({
                "id": "gen-1",
                "model": body["model"],
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })),
        ),
        "server error" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "boom"}})),
        ),
        "soft error" => (
            StatusCode::OK,
            Json(json!({"error": {"message": "Rate limit exceeded"}})),
        ),
        "take your time" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, Json(json!({"choices": []})))
        }
        _ => (StatusCode::OK, Json(json!({"unexpected": true}))),
    }
}

async fn captions(Path(model): Path<String>, Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(model, "test-captioner");
    Json(json!([{"generated_text": format!("a cat at {}", body["inputs"].as_str().unwrap())}]))
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/api/v1/chat/completions", post(completions))
        .route("/models/:model", post(captions));
    let addr = spawn(app).await;
    format!("http://{}", addr)
}

fn client(base: &str, key: &str, timeout: Duration) -> OpenRouterClient {
    OpenRouterClient::new(key.to_string(), format!("{}/api/v1", base), timeout).unwrap()
}

fn prompt(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system("be helpful"), ChatMessage::user(text)]
}

#[tokio::test]
async fn openrouter_success() {
    let base = spawn_upstream().await;
    let reply = client(&base, "sk-or-test", Duration::from_secs(5))
        .chat_completion("test/model", &prompt("hello"))
        .await
        .unwrap();
    assert_eq!(reply, "hi there");
}

#[tokio::test]
async fn openrouter_failures_are_classified() {
    let base = spawn_upstream().await;
    let llm = client(&base, "sk-or-test", Duration::from_secs(5));

    let err = llm
        .chat_completion("m", &prompt("server error"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 500, .. }), "{err}");

    let err = llm.chat_completion("m", &prompt("soft error")).await.unwrap_err();
    assert!(matches!(err, LlmError::Upstream(ref m) if m == "Rate limit exceeded"));

    let err = llm.chat_completion("m", &prompt("???")).await.unwrap_err();
    assert!(matches!(err, LlmError::Malformed(_)), "{err}");

    let err = client(&base, "wrong", Duration::from_secs(5))
        .chat_completion("m", &prompt("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 401, .. }));
}

#[tokio::test]
async fn openrouter_timeout() {
    let base = spawn_upstream().await;
    let err = client(&base, "sk-or-test", Duration::from_millis(300))
        .chat_completion("m", &prompt("take your time"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Timeout(_)), "{err}");
}

#[tokio::test]
async fn openrouter_unreachable_is_http_error() {
    let err = client("http://127.0.0.1:1", "sk-or-test", Duration::from_secs(2))
        .chat_completion("m", &prompt("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Http(_)), "{err}");
}

#[tokio::test]
async fn full_stack_round_trip_through_openrouter_client() {
    let base = spawn_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.openrouter_base_url = format!("{}/api/v1", base);
    let llm = Arc::new(OpenRouterClient::from_config(&config).unwrap());
    let addr = spawn_relay(config, llm).await;
    let mut socket = connect(addr).await;

    send(&mut socket, &ClientEvent::user_input("hello")).await;
    assert_eq!(
        recv(&mut socket).await,
        ServerEvent::message("hi there", MessageKind::Assistant)
    );

    send(&mut socket, &ClientEvent::user_input("server error")).await;
    assert!(matches!(recv(&mut socket).await, ServerEvent::Error(_)));
}

#[tokio::test]
async fn huggingface_caption() {
    let base = spawn_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.huggingface_base_url = base;
    config.huggingface_model = "test-captioner".to_string();

    config.huggingface_api_key = None;
    assert!(HuggingFaceClient::from_config(&config).unwrap().is_none());

    config.huggingface_api_key = Some("hf_test".to_string());
    let captioner = HuggingFaceClient::from_config(&config).unwrap().unwrap();
    let caption = captioner
        .describe_image("https://example.com/cat.png")
        .await
        .unwrap();
    assert_eq!(caption, "a cat at https://example.com/cat.png");
}
