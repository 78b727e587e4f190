// Shared harness for router tests: in-process router, fake relay workers,
// in-memory engine and room keys.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use livegate_api::{create_router, AppState};
use livegate_core::engine::{LiveHub, StreamProvider};
use livegate_core::relay::{RelayError, RelayFactory, RelaySessionRegistry, RelayWorker};
use livegate_core::room_keys::MemoryRoomKeys;
use livegate_core::Config;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const API_KEY: &str = "secret-key";

#[derive(Default)]
pub struct RelayCounts {
    pub created: AtomicUsize,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub fail_start: AtomicBool,
    pub last_source: parking_lot::Mutex<String>,
    pub last_target: parking_lot::Mutex<String>,
}

struct FakeRelay {
    counts: Arc<RelayCounts>,
}

#[async_trait]
impl RelayWorker for FakeRelay {
    async fn start(&mut self) -> Result<(), RelayError> {
        if self.counts.fail_start.load(Ordering::SeqCst) {
            return Err(RelayError::Start("connection refused".to_string()));
        }
        self.counts.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) {
        self.counts.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeRelayFactory {
    counts: Arc<RelayCounts>,
}

impl RelayFactory for FakeRelayFactory {
    fn create(&self, source_url: &str, target_url: &str) -> Box<dyn RelayWorker> {
        self.counts.created.fetch_add(1, Ordering::SeqCst);
        *self.counts.last_source.lock() = source_url.to_string();
        *self.counts.last_target.lock() = target_url.to_string();
        Box::new(FakeRelay {
            counts: Arc::clone(&self.counts),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub relays: Arc<RelaySessionRegistry>,
    pub counts: Arc<RelayCounts>,
    pub hub: LiveHub,
    pub room_keys: Arc<MemoryRoomKeys>,
    pub statics: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build the app from a default config with `API_KEY`, then `configure`
    pub fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        Self::build(configure, true)
    }

    /// Same as [`TestApp::new`] but with no engine attached
    pub fn detached() -> Self {
        Self::build(|_| {}, false)
    }

    fn build(configure: impl FnOnce(&mut Config), attach_engine: bool) -> Self {
        let statics = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.auth.api_key = API_KEY.to_string();
        config.server.rtmp_addr = ":1935".to_string();
        config.statics.dir = statics.path().to_string_lossy().into_owned();
        configure(&mut config);

        let counts = Arc::new(RelayCounts::default());
        let factory = Arc::new(FakeRelayFactory {
            counts: Arc::clone(&counts),
        });
        let relays = Arc::new(RelaySessionRegistry::new(
            factory,
            config.server.rtmp_addr.clone(),
        ));
        let hub = LiveHub::new();
        let room_keys = Arc::new(MemoryRoomKeys::new());
        let streams: Option<Arc<dyn StreamProvider>> = if attach_engine {
            Some(Arc::new(hub.clone()))
        } else {
            None
        };

        let state = AppState::new(&config, Arc::clone(&relays), streams, room_keys.clone()).unwrap();

        Self {
            router: create_router(state),
            relays,
            counts,
            hub,
            room_keys,
            statics,
        }
    }

    /// Send a request and decode the JSON envelope
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// GET `uri` with the API key set
    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(authed("GET", uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST `uri` with the API key set and an empty body
    pub async fn post(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(authed("POST", uri).body(Body::empty()).unwrap())
            .await
    }
}

pub fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", API_KEY)
}
