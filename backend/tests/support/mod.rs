#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use bookcase::cache::MemoryListCache;
use bookcase::db::repositories::LocalRepository;
use bookcase::events::InMemoryPublisher;
use bookcase::http::{create_router, AppState};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Router wired to in-memory backends, with handles on each of them.
pub struct TestApp {
    pub repo: Arc<LocalRepository>,
    pub cache: Arc<MemoryListCache>,
    pub events: Arc<InMemoryPublisher>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = Arc::new(LocalRepository::new());
        let cache = Arc::new(MemoryListCache::new());
        let events = Arc::new(InMemoryPublisher::new());
        let state = AppState::new(repo.clone(), cache.clone(), events.clone(), 16);
        Self {
            repo,
            cache,
            events,
            router: create_router(state),
        }
    }

    /// Send a request with an optional JSON body; returns the status and the
    /// decoded body (`Null` when the body is empty).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let raw = body.map(|b| b.to_string()).unwrap_or_default();
        self.send_raw(method, uri, &raw).await
    }

    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Create an entity and return its id; panics unless the API answers 201.
    pub async fn create(&self, uri: &str, body: Value) -> i64 {
        let (status, value) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", uri, value);
        value["id"].as_i64().unwrap()
    }

    pub async fn create_author(&self, name: &str) -> i64 {
        self.create(
            "/author/create",
            serde_json::json!({"name": name, "sex": "female", "birth_year": 1920}),
        )
        .await
    }

    pub async fn create_book(&self, name: &str) -> i64 {
        self.create("/book/create", serde_json::json!({"name": name}))
            .await
    }

    pub async fn create_reader(&self, email: &str) -> i64 {
        self.create(
            "/reader/create",
            serde_json::json!({"name": "Reader", "email": email}),
        )
        .await
    }
}
