//! Messages API client against an in-process stub server.
//!
//! The stub is a tiny axum app bound to `127.0.0.1:0`; no network access or
//! API key is needed.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use po_extract::pipeline::client::MessagesClient;
use po_extract::pipeline::encode::PageImage;
use po_extract::pipeline::request::build_request;
use po_extract::pipeline::response::parse_response;
use po_extract::{prompts, ExtractionConfig, ExtractionMode, PoExtractError};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Stub server ──────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Captured {
    headers: Arc<Mutex<Option<HeaderMap>>>,
    body: Arc<Mutex<Option<Value>>>,
}

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr) -> ExtractionConfig {
    ExtractionConfig::builder()
        .api_base_url(format!("http://{addr}/v1"))
        .api_timeout_secs(10)
        .build()
        .unwrap()
}

fn one_page_request() -> po_extract::pipeline::request::ExtractionRequest {
    build_request(
        prompts::system_prompt(ExtractionMode::Basic),
        &[PageImage {
            page_num: 1,
            data: "iVBORw0KGgo=".into(),
        }],
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_sends_contract_headers_and_body() {
    let captured = Captured::default();

    async fn handler(
        State(c): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        *c.headers.lock().unwrap() = Some(headers);
        *c.body.lock().unwrap() = Some(body);
        Json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "```json\n{\"a\":1}\n```"}]
        }))
    }

    let app = Router::new()
        .route("/v1/messages", post(handler))
        .with_state(captured.clone());
    let addr = spawn_stub(app).await;

    let client = MessagesClient::new("sk-ant-test", &config_for(addr)).unwrap();
    let reply = client.create_message(&one_page_request()).await.unwrap();
    let data = parse_response(&reply).unwrap();
    assert_eq!(Value::Object(data), json!({"a": 1}));

    let headers = captured.headers.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-api-key"], "sk-ant-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body = captured.body.lock().unwrap().take().unwrap();
    assert_eq!(body["model"], "claude-3-7-sonnet-20250219");
    assert_eq!(body["max_tokens"], 4000);
    assert_eq!(body["temperature"], 0.0);
    assert!(body["system"].as_str().unwrap().contains("purchase order"));

    let content = body["messages"][0]["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    assert_eq!(content[0]["type"], "image");
    assert_eq!(content[0]["source"]["media_type"], "image/png");
    assert_eq!(content[1]["type"], "text");
}

#[tokio::test]
async fn unauthorized_status_keeps_code_and_body() {
    async fn handler() -> impl IntoResponse {
        (
            StatusCode::UNAUTHORIZED,
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        )
    }

    let addr = spawn_stub(Router::new().route("/v1/messages", post(handler))).await;
    let client = MessagesClient::new("bad-key", &config_for(addr)).unwrap();
    let err = client.create_message(&one_page_request()).await.unwrap_err();

    assert!(matches!(err, PoExtractError::ApiStatus { status: 401, .. }));
    let msg = err.to_string();
    assert!(msg.contains("401"), "got: {msg}");
    assert!(msg.contains("invalid x-api-key"), "got: {msg}");
}

/// Read one HTTP request (headers plus `Content-Length` body) off `stream`.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let len = text[..end]
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }
}

#[tokio::test]
async fn truncated_error_body_reports_read_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        // Promise 100 bytes, send 5, hang up.
        stream
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\nConnection: close\r\n\r\noverl")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
    });

    let client = MessagesClient::new("sk-ant-test", &config_for(addr)).unwrap();
    let err = client.create_message(&one_page_request()).await.unwrap_err();
    match err {
        PoExtractError::ApiStatus { status, body } => {
            assert_eq!(status, 503);
            assert!(body.starts_with("<response body unreadable:"), "got: {body}");
        }
        other => panic!("expected ApiStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_content_is_reported() {
    async fn handler() -> Json<Value> {
        Json(json!({"content": []}))
    }

    let addr = spawn_stub(Router::new().route("/v1/messages", post(handler))).await;
    let client = MessagesClient::new("sk-ant-test", &config_for(addr)).unwrap();
    let reply = client.create_message(&one_page_request()).await.unwrap();
    let err = parse_response(&reply).unwrap_err();
    assert_eq!(err.to_string(), "No content in response");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MessagesClient::new("sk-ant-test", &config_for(addr)).unwrap();
    let err = client.create_message(&one_page_request()).await.unwrap_err();
    assert!(matches!(err, PoExtractError::Transport(_)), "got: {err:?}");
    assert!(err.to_string().starts_with("Error with direct Anthropic API call"));
}
