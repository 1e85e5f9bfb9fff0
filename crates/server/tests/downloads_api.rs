//! API surface tests against the in-process server.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_reports_downloader_settings() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["downloader"]["audio_format"], "mp3");
    assert_eq!(response.body["library"]["default_genre"], "YouTube");
}

#[tokio::test]
async fn test_create_download_without_url_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/downloads", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "URL is required");
}

#[tokio::test]
async fn test_create_download_with_blank_url_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/downloads", json!({ "url": "   " }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "URL is required");
}

#[tokio::test]
async fn test_create_download_returns_job_id_immediately() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/downloads",
            json!({ "url": "https://youtube.com/watch?v=abc" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let job_id = response.body["jobId"].as_str().unwrap();
    assert!(job_id.starts_with("dl-"));

    // The job is registered before any progress has been made.
    assert!(fixture.registry.get(job_id).await.is_some());

    // The job snapshot is available right away.
    let snapshot = fixture.get(&format!("/api/v1/downloads/{job_id}")).await;
    assert_eq!(snapshot.status, StatusCode::OK);
    assert_eq!(snapshot.body["sourceUrl"], "https://youtube.com/watch?v=abc");
}

#[tokio::test]
async fn test_get_unknown_download_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/downloads/dl-missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_for_unknown_job_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .get("/api/v1/downloads/dl-missing/progress")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Job not found: dl-missing");
}

#[tokio::test]
async fn test_list_tracks_starts_empty() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/tracks").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_pipeline_metrics() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
}
