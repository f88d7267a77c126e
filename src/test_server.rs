//! In-process archive host for tests.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ServerState {
    hits: Mutex<HashMap<String, usize>>,
    fail_first: Mutex<HashMap<String, usize>>,
    fail_always: Mutex<HashSet<String>>,
    truncate: Mutex<HashSet<String>>,
    stall: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

pub struct TestServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

/// Client that never routes loopback traffic through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client")
}

impl TestServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/:name", get(serve_archive))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Deterministic payload larger than one 32 KiB chunk.
    pub fn body_for(name: &str) -> Vec<u8> {
        let seed = name.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
        (0..100_000 + name.len())
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect()
    }

    pub fn fail_first(&self, name: &str, times: usize) {
        self.state
            .fail_first
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
    }

    pub fn fail_always(&self, name: &str) {
        self.state.fail_always.lock().unwrap().insert(name.to_string());
    }

    /// Send the headers and the first part of the body, then abort the connection.
    pub fn truncate_always(&self, name: &str) {
        self.state.truncate.lock().unwrap().insert(name.to_string());
    }

    /// Send the headers and the first part of the body, then go silent.
    pub fn stall_always(&self, name: &str) {
        self.state.stall.lock().unwrap().insert(name.to_string());
    }

    pub fn hits(&self, name: &str) -> usize {
        self.state.hits.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

async fn serve_archive(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Response {
    *state.hits.lock().unwrap().entry(name.clone()).or_insert(0) += 1;

    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(10)).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    if state.fail_always.lock().unwrap().contains(&name) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    {
        let mut fail_first = state.fail_first.lock().unwrap();
        if let Some(remaining) = fail_first.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    let body = TestServer::body_for(&name);
    let head = Bytes::copy_from_slice(&body[..body.len() / 2]);
    if state.truncate.lock().unwrap().contains(&name) {
        let chunks = stream::iter(vec![
            Ok(head),
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted")),
        ]);
        return partial(body.len(), Body::from_stream(chunks));
    }
    if state.stall.lock().unwrap().contains(&name) {
        let chunks = stream::iter(vec![Ok::<_, io::Error>(head)]).chain(stream::pending());
        return partial(body.len(), Body::from_stream(chunks));
    }

    (StatusCode::OK, body).into_response()
}

fn partial(full_len: usize, body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, full_len)
        .body(body)
        .expect("partial response")
}
