//! HTTP surface tests against in-process fakes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use vmerge_api::{create_router, ApiConfig, AppState};
use vmerge_media::{CaptionLayout, MediaFetcher, MediaResult, MediaTransformEngine};
use vmerge_pipeline::{InMemoryJobRegistry, Orchestrator, PipelineConfig};
use vmerge_storage::{ObjectStorePublisher, StoragePublisher, StorageResult};

struct FakeFetcher;

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        let body = format!("clip from {url}");
        tokio::fs::write(destination, &body).await?;
        Ok(body.len() as u64)
    }
}

struct FakeEngine;

#[async_trait]
impl MediaTransformEngine for FakeEngine {
    async fn overlay_text(&self, input: &Path, output: &Path, _layout: &CaptionLayout) -> MediaResult<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn concat_copy(&self, inputs: &[&Path], output: &Path) -> MediaResult<()> {
        let mut body = Vec::new();
        for input in inputs {
            body.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, body).await?;
        Ok(())
    }

    async fn concat_filter(&self, first: &Path, second: &Path, output: &Path) -> MediaResult<()> {
        self.concat_copy(&[first, second], output).await
    }
}

struct FakePublisher;

#[async_trait]
impl StoragePublisher for FakePublisher {
    async fn publish(&self, _local: &Path, logical_name: &str) -> StorageResult<String> {
        Ok(format!("https://cdn.test/videos/{logical_name}"))
    }
}

struct TestApp {
    router: Router,
    registry: Arc<InMemoryJobRegistry>,
    _work_dir: TempDir,
}

fn app_with(storage: Arc<dyn StoragePublisher>) -> TestApp {
    let work_dir = TempDir::new().unwrap();
    let registry = Arc::new(InMemoryJobRegistry::new());
    let config = PipelineConfig {
        work_dir: work_dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let orchestrator = Orchestrator::new(
        registry.clone(),
        Arc::new(FakeFetcher),
        Arc::new(FakeEngine),
        Arc::clone(&storage),
        config,
    );
    let state = AppState::from_parts(ApiConfig::default(), orchestrator, storage);

    TestApp {
        router: create_router(state, None),
        registry,
        _work_dir: work_dir,
    }
}

fn app() -> TestApp {
    app_with(Arc::new(FakePublisher))
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_payload() -> Value {
    json!({
        "sourceClipUrl": "https://media.test/ugc.mp4",
        "overlayClipUrl": "https://media.test/demo.mp4",
        "captionText": "wait for the end",
        "alignment": "middle"
    })
}

#[tokio::test]
async fn test_submit_returns_job_id_and_job_completes() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", valid_payload().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert!(!job_id.is_empty());

    let mut job = Value::Null;
    for _ in 0..100 {
        let response = app
            .router
            .clone()
            .oneshot(Request::get(format!("/api/jobs/{job_id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        job = json_body(response).await;
        if job["status"] != "processing" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(job["id"], job_id.as_str());
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["videoUrl"], format!("https://cdn.test/videos/{job_id}.mp4"));
    assert!(job.get("error").is_none());
}

#[tokio::test]
async fn test_submit_rejects_invalid_urls() {
    let app = app();
    let mut payload = valid_payload();
    payload["overlayClipUrl"] = json!("not a url");

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("overlay_clip_url"));
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_submit_rejects_empty_caption() {
    let app = app();
    let mut payload = valid_payload();
    payload["captionText"] = json!("");

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_submit_rejects_whitespace_caption() {
    let app = app();
    let mut payload = valid_payload();
    payload["captionText"] = json!("   ");

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("Caption text must not be empty"));
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_submit_rejects_malformed_json() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", "{\"sourceClipUrl\": "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", json!({"captionText": "hi"}).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_submit_rejects_unknown_alignment() {
    let app = app();
    let mut payload = valid_payload();
    payload["alignment"] = json!("left");

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/jobs", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_get_unknown_job_is_404() {
    let app = app();

    let response = app
        .router
        .oneshot(Request::get("/api/jobs/does-not-exist").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Job does-not-exist not found");
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = app();

    let response = app
        .router
        .oneshot(
            Request::get("/health")
                .header("X-Request-ID", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ready_degraded_without_storage() {
    let app = app_with(Arc::new(ObjectStorePublisher::unconfigured("S3_BUCKET_NAME not set")));

    let response = app
        .router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["storage"]["status"], "error");
    assert!(body["checks"]["storage"]["error"]
        .as_str()
        .unwrap()
        .contains("S3_BUCKET_NAME"));
}

#[tokio::test]
async fn test_metrics_route_absent_without_handle() {
    let app = app();

    let response = app
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
