//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dfd_api::config::ApiConfig;
use dfd_api::security::{Clock, ManualClock, SystemClock};
use dfd_api::{AppState, HttpServer, Shutdown};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

/// 2026-01-15T12:00:00Z
pub const START_MILLIS: u64 = 1_768_478_400_000;

/// Defaults with a short padding target so tests stay fast.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.latency.target_ms = 50;
    config.latency.jitter_ms = 0;
    config.csrf.secret = Some(TEST_SECRET.to_string());
    config
}

pub fn manual_state(config: ApiConfig) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let state = AppState::new(config, clock.clone() as Arc<dyn Clock>);
    (state, clock)
}

/// A request as the router sees it behind `into_make_service_with_connect_info`.
pub fn request(method: Method, uri: &str, peer: SocketAddr, body: Body) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 40000))
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A server bound to an ephemeral port, reading the system clock.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start(config: ApiConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let state = AppState::new(config, Arc::new(SystemClock));
        let handle = tokio::spawn(HttpServer::with_state(state).run(listener, shutdown.subscribe()));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}
