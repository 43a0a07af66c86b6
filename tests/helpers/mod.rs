//! Test helper utilities for engine and API tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tower::ServiceExt;

use syncbridge::app_state::AppState;
use syncbridge::models::job::{Job, JobKind, SourceFile};
use syncbridge::routes;
use syncbridge::services::backend::{ProcessingFault, SimulatedBackend, TranscriptionBackend};
use syncbridge::services::engine::{EngineSettings, TranscriptionEngine};
use syncbridge::services::session::SessionStore;
use syncbridge::services::subscription::Subscription;

use crate::fixtures::UploadFixture;

pub const BOUNDARY: &str = "syncbridge-test-boundary";

/// Engine with the production cadence (200 ms ticks, 3 s image / 4 s audio).
pub fn simulated_engine() -> TranscriptionEngine {
    TranscriptionEngine::simulated(EngineSettings::default(), SimulatedBackend::default())
}

/// Backend that reports a processing fault after a delay.
pub struct FailingBackend {
    pub delay: Duration,
    pub message: &'static str,
}

#[async_trait]
impl TranscriptionBackend for FailingBackend {
    async fn transcribe(
        &self,
        _kind: JobKind,
        _source: &SourceFile,
    ) -> Result<String, ProcessingFault> {
        tokio::time::sleep(self.delay).await;
        Err(ProcessingFault(self.message.to_string()))
    }
}

pub fn failing_engine(delay: Duration, message: &'static str) -> TranscriptionEngine {
    TranscriptionEngine::new(
        EngineSettings::default(),
        Arc::new(FailingBackend { delay, message }),
    )
}

/// Drain a subscription until the job reaches a terminal state.
pub async fn collect_updates(subscription: &mut Subscription) -> Vec<Job> {
    let mut updates = Vec::new();
    while let Some(job) = subscription.recv().await {
        updates.push(job);
    }
    updates
}

/// Assert progress never decreases across a sequence of snapshots.
pub fn assert_monotonic(updates: &[Job]) {
    for pair in updates.windows(2) {
        assert!(
            pair[1].progress >= pair[0].progress,
            "progress went backwards: {} -> {}",
            pair[0].progress,
            pair[1].progress
        );
    }
}

/// Router plus the engine behind it, with a session file in a temp dir.
pub struct TestApp {
    pub router: Router,
    pub engine: TranscriptionEngine,
    pub _dir: tempfile::TempDir,
}

pub async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let session = SessionStore::load_or_empty(dir.path().join("session.json")).await;
    let engine = simulated_engine();
    let state = AppState::new(engine.clone(), session);
    TestApp {
        router: routes::router(state),
        engine,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    pub async fn login(&self) {
        let response = self
            .send(json_request(
                "POST",
                "/api/v1/session/login",
                serde_json::json!({ "email": "ada@example.com", "password": "secret" }),
            ))
            .await;
        assert!(
            response.status().is_success(),
            "login failed: {}",
            response.status()
        );
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Build a multipart upload of `fixture` in the `file` field.
pub fn upload_request(uri: &str, fixture: &UploadFixture) -> Request<Body> {
    upload_bytes(uri, fixture.filename, fixture.media_type, fixture.bytes)
}

/// Build a multipart upload of raw `bytes` in the `file` field.
pub fn upload_bytes(uri: &str, filename: &str, media_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("Failed to build request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}
