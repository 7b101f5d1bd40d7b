#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use homework_notifier::config::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const PRACTICUM_TOKEN: &str = "practicum-token";
pub const BOT_TOKEN: &str = "123456:bot-secret";
pub const CHAT_ID: &str = "424242";

#[derive(Debug, Clone)]
pub struct StatusRequest {
    pub authorization: Option<String>,
    pub from_date: Option<String>,
}

#[derive(Default)]
pub struct Recorded {
    pub status_requests: Vec<StatusRequest>,
    pub bot_paths: Vec<String>,
    pub sent: Vec<Value>,
}

#[derive(Clone)]
pub struct Stub {
    pub addr: SocketAddr,
    pub recorded: Arc<Mutex<Recorded>>,
}

struct StubState {
    recorded: Arc<Mutex<Recorded>>,
    status_reply: (StatusCode, String),
    bot_reply: (StatusCode, Value),
}

/// Serves the homework status endpoint and the Bot API `sendMessage` method.
pub async fn spawn_stub(status_reply: (StatusCode, String), bot_reply: (StatusCode, Value)) -> Stub {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let state = Arc::new(StubState {
        recorded: recorded.clone(),
        status_reply,
        bot_reply,
    });

    let app = Router::new()
        .route("/api/user_api/homework_statuses/", get(homework_statuses))
        .route("/:bot/sendMessage", post(send_message))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });

    Stub { addr, recorded }
}

async fn homework_statuses(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.recorded.lock().unwrap().status_requests.push(StatusRequest {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        from_date: params.get("from_date").cloned(),
    });
    state.status_reply.clone()
}

async fn send_message(
    State(state): State<Arc<StubState>>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.bot_paths.push(bot);
        recorded.sent.push(body);
    }
    let (status, reply) = state.bot_reply.clone();
    (status, Json(reply))
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let addr = listener.local_addr().expect("free port addr");
    drop(listener);
    addr
}

pub fn bot_ok() -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "ok": true,
            "result": {
                "message_id": 7,
                "date": 1700000000,
                "chat": {"id": 424242, "type": "private", "username": "student"},
                "text": "ignored"
            }
        }),
    )
}

pub fn status_ok(body: Value) -> (StatusCode, String) {
    (StatusCode::OK, body.to_string())
}

pub fn config_for(stub: &Stub) -> Config {
    Config {
        practicum_token: PRACTICUM_TOKEN.to_string(),
        telegram_token: BOT_TOKEN.to_string(),
        telegram_chat_id: CHAT_ID.to_string(),
        endpoint: format!("http://{}/api/user_api/homework_statuses/", stub.addr),
        telegram_api_url: format!("http://{}", stub.addr),
        retry_time: Duration::from_secs(600),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

/// In-memory sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(pub Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
