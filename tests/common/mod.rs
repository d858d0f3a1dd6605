#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use infernum_cad::{ClientConfig, ConnectionConfig, PresentationSink};
use serde_json::Value;
use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex, mpsc},
    thread::JoinHandle,
    time::Duration,
};

/// What the mock server answers to the next request.
#[derive(Clone, Debug)]
pub enum Reply {
    Json(Value),
    Status(u16, String),
    Raw(String),
    Delayed(Duration, Value),
}

struct MockState {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Value>>,
}

/// In-process stand-in for the inference server's generate endpoint.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

async fn generate(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);
    let reply = state.replies.lock().unwrap().pop_front();

    match reply {
        Some(Reply::Json(value)) => (StatusCode::OK, Json(value)).into_response(),
        Some(Reply::Status(code, body)) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, body).into_response()
        }
        Some(Reply::Raw(body)) => (StatusCode::OK, body).into_response(),
        Some(Reply::Delayed(delay, value)) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(value)).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no scripted reply").into_response(),
    }
}

impl MockServer {
    pub fn start(replies: Vec<Reply>) -> Self {
        let state = Arc::new(MockState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });
        let (addr_tx, addr_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = std::thread::spawn({
            let state = state.clone();
            move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                    addr_tx.send(listener.local_addr().unwrap()).unwrap();

                    let app = Router::new()
                        .route("/api/generate", post(generate))
                        .with_state(state);

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async {
                            let _ = shutdown_rx.await;
                        })
                        .await
                        .unwrap();
                });
            }
        });

        let addr = addr_rx.recv().unwrap();

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connection: ConnectionConfig::new(self.addr.ip().to_string(), self.addr.port()),
            probe_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| body["prompt"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Returns a local address nothing is listening on.
pub fn closed_port_config() -> ClientConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    ClientConfig {
        connection: ConnectionConfig::new("127.0.0.1", port),
        probe_timeout: Duration::from_secs(2),
        query_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    }
}

#[derive(Debug, PartialEq)]
pub enum Event {
    Text(String),
    Warning(String, String),
    Failure(String),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl PresentationSink for RecordingSink {
    fn show_text(&mut self, text: &str) {
        self.events.push(Event::Text(text.to_string()));
    }

    fn show_warning(&mut self, title: &str, message: &str) {
        self.events
            .push(Event::Warning(title.to_string(), message.to_string()));
    }

    fn show_failure(&mut self, message: &str) {
        self.events.push(Event::Failure(message.to_string()));
    }
}
