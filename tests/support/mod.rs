// Shared in-process game server for client integration tests.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{
        Query,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use game_client::interface_adapters::input::ConsoleLine;
use game_client::interface_adapters::view::View;
use std::{
    collections::HashMap,
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

// Global address ("host:port") used by all tests after the server binds.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub const INVALID_FRAMES: usize = 11;

// Ensure the test server is running and return its "host:port".
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        // Local one-time slot where the server thread publishes its address.
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                axum::serve(listener, app()).await.expect("server failed");
            });
        });
        wait_for_readiness(published);
    });

    SERVER_ADDR
        .get()
        .expect("server addr should be initialized")
        .as_str()
}

pub fn ws_url(path: &str) -> url::Url {
    url::Url::parse(&format!("ws://{}{}", ensure_server(), path)).expect("valid test url")
}

pub fn http_url(path: &str) -> String {
    format!("http://{}{}", ensure_server(), path)
}

fn wait_for_readiness(published: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_ADDR.set(addr.clone());

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

fn app() -> Router {
    Router::new()
        .route("/ws", get(echo_handler))
        .route("/garbage", get(garbage_handler))
        .route("/greet", get(greet_handler))
        .route("/broadcast", get(broadcast_handler))
        .route("/binary", get(binary_handler))
        .route("/health", get(|| async { Json(serde_json::json!({"message": "OK"})) }))
}

// Echoes chat back and stamps movement with the caller's client_id.
async fn echo_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let client_id = query
        .get("client_id")
        .cloned()
        .unwrap_or_else(|| "anonymous".to_string());
    ws.on_upgrade(move |socket| echo(socket, client_id))
}

async fn echo(mut socket: WebSocket, client_id: String) {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                let Ok(mut value) = serde_json::from_str::<serde_json::Value>(text.as_str())
                else {
                    continue;
                };
                if value["type"] == "movement" {
                    value["id"] = serde_json::Value::String(client_id.clone());
                }
                if socket
                    .send(Message::Text(value.to_string().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

// Echoes every frame untouched, like a bare broadcast server: movement
// comes back without an id.
async fn broadcast_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        while let Some(Ok(message)) = socket.recv().await {
            match message {
                Message::Text(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    })
}

// Sends as many binary frames as would exceed the invalid-frame limit,
// then a chat line, then closes.
async fn binary_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        for _ in 0..INVALID_FRAMES {
            if socket
                .send(Message::Binary(vec![0xde, 0xad, 0xbe, 0xef].into()))
                .await
                .is_err()
            {
                return;
            }
        }
        let _ = socket
            .send(Message::Text(
                r#"{"type":"chat","content":"after binary"}"#.into(),
            ))
            .await;
        let _ = socket.send(Message::Close(None)).await;
    })
}

// Sends more malformed frames than the client tolerates, then drains.
async fn garbage_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        for _ in 0..INVALID_FRAMES {
            if socket.send(Message::Text("not json".into())).await.is_err() {
                return;
            }
        }
        while let Some(Ok(message)) = socket.recv().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    })
}

// Sends one chat line and closes.
async fn greet_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        let _ = socket
            .send(Message::Text(
                r#"{"type":"chat","content":"welcome"}"#.into(),
            ))
            .await;
        let _ = socket.send(Message::Close(None)).await;
    })
}

pub fn line(text: &str, received_at: Instant) -> ConsoleLine {
    ConsoleLine {
        text: text.to_string(),
        received_at,
    }
}

// Waits until a rendered view matches, failing the test after a few seconds.
pub async fn wait_for_view<P>(views: &mut mpsc::UnboundedReceiver<View>, predicate: P) -> View
where
    P: Fn(&View) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(view) = views.recv().await {
            if predicate(&view) {
                return view;
            }
        }
        panic!("render channel closed before the expected view");
    })
    .await
    .expect("timed out waiting for view")
}
