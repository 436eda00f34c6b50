#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use stranger_chat::config::{Config, Environment};
use stranger_chat::state::AppState;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration suitable for tests: loopback, ephemeral port, no static files.
pub fn test_config() -> Config {
    Config {
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
        public_dir: None,
    }
}

pub fn test_state() -> AppState {
    AppState::new(test_config())
}

pub fn test_app(state: AppState) -> Router {
    stranger_chat::routes::router().with_state(state)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

/// Serve the app on an ephemeral loopback port and return its address.
pub async fn spawn_server(state: AppState) -> Option<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let app = test_app(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Some(addr)
}

pub async fn connect(addr: SocketAddr) -> Option<WsClient> {
    let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .ok()?;
    Some(ws)
}

pub async fn send_json(ws: &mut WsClient, value: &serde_json::Value) {
    let _ = ws.send(Message::Text(value.to_string().into())).await;
}

pub async fn send_raw(ws: &mut WsClient, text: &str) {
    let _ = ws.send(Message::Text(text.to_string().into())).await;
}

/// Wait up to two seconds for the next JSON text frame.
pub async fn recv_json(ws: &mut WsClient) -> Option<serde_json::Value> {
    let deadline = tokio::time::sleep(Duration::from_secs(2));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = &mut deadline => return None,
            msg = ws.next() => match msg? {
                Ok(Message::Text(text)) => return serde_json::from_str(text.as_str()).ok(),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => {}
            },
        }
    }
}

/// Assert that nothing arrives within a short window.
pub async fn expect_silence(ws: &mut WsClient) -> bool {
    tokio::time::timeout(Duration::from_millis(200), ws.next())
        .await
        .is_err()
}
