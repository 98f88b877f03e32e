//! Shared helpers for pipeline and HTTP integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use visit_jobs::app_state::AppState;
use visit_jobs::db::queries;
use visit_jobs::models::job::JobStatus;
use visit_jobs::models::submission::{SubmitRequest, VisitInput};
use visit_jobs::routes;
use visit_jobs::services::analyzer::ImageAnalyzer;
use visit_jobs::services::processor::ImageProcessor;

/// Deterministic analyzer for tests.
///
/// References starting with `fail` fail, references starting with `slow`
/// take ten seconds, references starting with `panic` panic, everything else
/// succeeds after `delay`. Tracks the peak number of concurrent calls.
pub struct ScriptedAnalyzer {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, image_ref: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image_ref.starts_with("panic") {
            panic!("analyzer blew up on {image_ref}");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = if image_ref.starts_with("slow") {
            Duration::from_secs(10)
        } else {
            self.delay
        };
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        !image_ref.starts_with("fail")
    }
}

pub fn processor(
    pool: &SqlitePool,
    analyzer: Arc<dyn ImageAnalyzer>,
    max_concurrent_images: usize,
    image_timeout: Duration,
) -> Arc<ImageProcessor> {
    Arc::new(ImageProcessor::new(
        pool.clone(),
        analyzer,
        max_concurrent_images,
        image_timeout,
    ))
}

/// Router wired exactly like the binary, minus the metrics endpoint.
pub fn build_test_app(pool: SqlitePool, analyzer: Arc<dyn ImageAnalyzer>) -> Router {
    let processor = ImageProcessor::new(pool.clone(), analyzer, 16, Duration::from_secs(5));
    routes::router(AppState::new(pool, processor))
}

pub fn batch(visits: &[(&str, &[&str])]) -> SubmitRequest {
    SubmitRequest {
        count: visits.len() as i64,
        visits: visits
            .iter()
            .map(|(store_id, images)| VisitInput {
                store_id: store_id.to_string(),
                image_url: images.iter().map(|s| s.to_string()).collect(),
                visit_time: Some("2024-06-01T10:00:00Z".to_string()),
            })
            .collect(),
    }
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn job_status(pool: &SqlitePool, job_id: i64) -> Option<JobStatus> {
    queries::get_job(pool, job_id)
        .await
        .unwrap()
        .map(|job| job.status)
}

/// Send one request and decode the JSON body (`Null` for an empty body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Poll `/api/status` until the job leaves `ongoing`.
pub async fn poll_until_terminal(app: &Router, job_id: i64) -> serde_json::Value {
    for _ in 0..200 {
        let (status, body) = get(app, &format!("/api/status?jobid={job_id}")).await;
        assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
        if body["status"] != "ongoing" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} did not reach a terminal status");
}
