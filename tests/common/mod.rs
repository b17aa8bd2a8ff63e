//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use iptv_admin::{AppConfig, HttpServer};

/// Request heads received by a mock upstream, one string per request.
pub type Captured = Arc<Mutex<Vec<String>>>;

/// Start a raw HTTP/1.1 upstream on an ephemeral port that answers every
/// request with `status_line`, `headers` and `body`, then closes.
pub async fn start_mock_upstream(
    status_line: &'static str,
    headers: Vec<(&'static str, String)>,
    body: &'static [u8],
) -> (SocketAddr, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::default();
    tokio::spawn(serve_fixed(listener, status_line, headers, body, captured.clone()));
    (addr, captured)
}

/// Reserve a port, leave it closed for `delay`, then answer `200 OK` with
/// `body` on it.
pub async fn start_late_upstream(delay: Duration, body: &'static [u8]) -> (SocketAddr, Captured) {
    let addr = closed_port().await;
    let captured: Captured = Arc::default();
    let seen = captured.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        serve_fixed(listener, "200 OK", vec![], body, seen).await;
    });
    (addr, captured)
}

/// Start an upstream that sends its head and `first` at once, holds the
/// connection for `pause`, then sends `rest` and closes. The body has no
/// length and ends with the connection.
pub async fn start_trickling_upstream(
    first: &'static [u8],
    pause: Duration,
    rest: &'static [u8],
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_head(&mut socket).await;
                let head = b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nConnection: close\r\n\r\n";
                let _ = socket.write_all(head).await;
                let _ = socket.write_all(first).await;
                let _ = socket.flush().await;
                tokio::time::sleep(pause).await;
                let _ = socket.write_all(rest).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

async fn serve_fixed(
    listener: TcpListener,
    status_line: &'static str,
    headers: Vec<(&'static str, String)>,
    body: &'static [u8],
    seen: Captured,
) {
    while let Ok((mut socket, _)) = listener.accept().await {
        let seen = seen.clone();
        let headers = headers.clone();
        tokio::spawn(async move {
            let head = read_head(&mut socket).await;
            seen.lock().unwrap().push(head);

            let mut response = format!("HTTP/1.1 {}\r\n", status_line);
            for (name, value) in &headers {
                response.push_str(&format!("{}: {}\r\n", name, value));
            }
            response.push_str("Connection: close\r\n\r\n");

            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        });
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Serve the full application on an ephemeral port.
pub async fn start_app(config: AppConfig) -> SocketAddr {
    let server = HttpServer::new(config).unwrap();
    let app = server.router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// --- Mock backend admin API ---

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "secret";
pub const TOKEN: &str = "test-token";

/// Calls received by the mock backend, as `METHOD path`.
#[derive(Clone, Default)]
pub struct BackendLog(Arc<Mutex<Vec<String>>>);

impl BackendLog {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> axum::response::Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid or expired token" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
    if body["username"] == ADMIN_USER && body["password"] == ADMIN_PASSWORD {
        Json(json!({ "token": TOKEN, "expires_in": 3600 })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response()
    }
}

async fn list_channels(State(log): State<BackendLog>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    log.push("GET /channels".into());
    Json(json!([
        { "id": 1, "name": "Sports 1", "logo": "", "mpd": "https://cdn.example.test/s1.mpd",
          "key": "k1", "expires_every": 3600, "packages": [] },
        { "id": 2, "name": "News", "logo": "", "mpd": "https://cdn.example.test/n.mpd",
          "key": "k2", "expires_every": 3600, "packages": [] }
    ]))
    .into_response()
}

async fn create_channel(
    State(log): State<BackendLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "name is required" }))).into_response();
    }
    log.push("POST /channels".into());
    let mut created = body;
    created["id"] = json!(7);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn link_channel(
    State(log): State<BackendLog>,
    headers: HeaderMap,
    method: axum::http::Method,
    Path((package_id, channel_id)): Path<(u32, u32)>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if package_id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Package not found" }))).into_response();
    }
    log.push(format!("{} /packages/{}/channels/{}", method, package_id, channel_id));
    Json(json!({ "message": "ok" })).into_response()
}

/// Start the mock backend; returns its API base url and call log.
pub async fn start_mock_backend() -> (String, BackendLog) {
    let log = BackendLog::default();
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/admin/channels", get(list_channels).post(create_channel))
        .route(
            "/api/admin/packages/{package_id}/channels/{channel_id}",
            post(link_channel).delete(link_channel),
        )
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), log)
}

/// Start an upstream that accepts connections but never answers.
pub async fn start_silent_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// `/proxy?url=…` with the target percent-encoded.
pub fn proxy_uri(target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/proxy?url={}", encoded)
}

/// HTTP client for talking to the app under test: no redirects followed.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
