#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{routing::post, Json, Router};
use bytes::Bytes;
use knownagents::{AgentsApi, ApiError, RobotsPolicy, VisitEvent};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Tracks environment variable mutations and restores originals on drop.
pub struct EnvGuard {
    originals: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn new() -> Self {
        Self {
            originals: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.capture(key);
        std::env::set_var(key, value);
    }

    pub fn set_many(&mut self, entries: &[(&str, &str)]) {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.capture(key);
        std::env::remove_var(key);
    }

    fn capture(&mut self, key: &str) {
        if self.originals.contains_key(key) {
            return;
        }
        let original = std::env::var(key).ok();
        self.originals.insert(key.to_string(), original);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, original) in self.originals.drain() {
            match original {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// In-process test double for the Known Agents API.
pub struct CapturingApi {
    pub robots_txt: Result<Bytes, u16>,
    pub policies: Mutex<Vec<RobotsPolicy>>,
    pub visits: Mutex<Vec<VisitEvent>>,
}

impl CapturingApi {
    pub fn new(robots_txt: &'static str) -> Arc<Self> {
        Arc::new(Self {
            robots_txt: Ok(Bytes::from_static(robots_txt.as_bytes())),
            policies: Mutex::new(Vec::new()),
            visits: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            robots_txt: Err(status),
            policies: Mutex::new(Vec::new()),
            visits: Mutex::new(Vec::new()),
        })
    }

    pub fn visits(&self) -> Vec<VisitEvent> {
        self.visits.lock().unwrap().clone()
    }

    pub fn policies(&self) -> Vec<RobotsPolicy> {
        self.policies.lock().unwrap().clone()
    }

    /// Poll until at least `n` visits were captured or the timeout elapses.
    pub async fn wait_for_visits(&self, n: usize, timeout: Duration) -> Vec<VisitEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let visits = self.visits();
            if visits.len() >= n || tokio::time::Instant::now() >= deadline {
                return visits;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait::async_trait]
impl AgentsApi for CapturingApi {
    async fn generate_robots_txt(&self, policy: &RobotsPolicy) -> Result<Bytes, ApiError> {
        self.policies.lock().unwrap().push(policy.clone());
        match &self.robots_txt {
            Ok(body) => Ok(body.clone()),
            Err(status) => Err(ApiError::Status {
                endpoint: "capturing".into(),
                status: *status,
            }),
        }
    }

    async fn record_visit(&self, event: &VisitEvent) -> Result<u16, ApiError> {
        self.visits.lock().unwrap().push(event.clone());
        Ok(202)
    }
}

/// Requests received by the mock HTTP API.
#[derive(Clone, Default)]
pub struct MockApi {
    pub robots_requests: Arc<Mutex<Vec<(HeaderMap, RobotsPolicy)>>>,
    pub visits: Arc<Mutex<Vec<(HeaderMap, VisitEvent)>>>,
    robots_status: u16,
    robots_body: &'static str,
}

impl MockApi {
    pub fn visit_count(&self) -> usize {
        self.visits.lock().unwrap().len()
    }

    pub async fn wait_for_visits(&self, n: usize, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let count = self.visit_count();
            if count >= n || tokio::time::Instant::now() >= deadline {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

async fn robots_txts(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Json(policy): Json<RobotsPolicy>,
) -> (StatusCode, &'static str) {
    mock.robots_requests.lock().unwrap().push((headers, policy));
    let status = StatusCode::from_u16(mock.robots_status).unwrap_or(StatusCode::OK);
    (status, mock.robots_body)
}

async fn visits(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Json(event): Json<VisitEvent>,
) -> StatusCode {
    mock.visits.lock().unwrap().push((headers, event));
    StatusCode::ACCEPTED
}

/// Spin up a mock Known Agents API on an ephemeral port. Returns its base URL.
pub async fn start_mock_api(
    robots_status: u16,
    robots_body: &'static str,
) -> (String, MockApi, JoinHandle<()>) {
    let mock = MockApi {
        robots_status,
        robots_body,
        ..MockApi::default()
    };
    let app = Router::new()
        .route("/robots-txts", post(robots_txts))
        .route("/visits", post(visits))
        .with_state(mock.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), mock, handle)
}
