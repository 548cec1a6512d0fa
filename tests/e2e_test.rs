//! End-to-end tests through the HTTP router.
//!
//! The full application is assembled in-process against a scripted
//! downloader; requests go through `tower::ServiceExt::oneshot`, so no
//! port is bound and no yt-dlp install is needed.

#![cfg(unix)]

mod fixtures;
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tower::ServiceExt;

use bippi_dl::app_state::AppState;
use bippi_dl::routes;
use bippi_dl::services::jobs::JobStore;
use bippi_dl::services::metadata::MetadataResolver;
use bippi_dl::services::supervisor::JobSupervisor;
use helpers::{FakeDownloader, SUCCESSFUL_DOWNLOAD};

fn app(fake: &FakeDownloader) -> Router {
    let jobs = Arc::new(JobStore::new());
    let settings = fake.settings(None);
    let supervisor = JobSupervisor::new(jobs.clone(), settings.clone(), fake.output_dir.clone());
    let metadata = MetadataResolver::new(settings, Duration::from_secs(5));
    let state = AppState::new(jobs, supervisor, metadata);

    let prometheus = PrometheusBuilder::new().build_recorder().handle();
    routes::app(state, Arc::new(prometheus))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_e2e_health_check() {
    let fake = FakeDownloader::new("exit 0");
    let app = app(&fake);

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["downloader"]["status"], "ok");
    assert_eq!(body["active_jobs"], 0);
}

#[tokio::test]
async fn test_e2e_validate_returns_metadata() {
    let fake = FakeDownloader::new("cat \"$(dirname \"$0\")/payload.json\"");
    fake.write_asset("payload.json", fixtures::SINGLE_VIDEO);
    let app = app(&fake);

    let (status, body) = post_json(
        &app,
        "/api/validate",
        json!({ "url": "https://youtu.be/dQw4w9WgXcQ?si=abc" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["metadata"]["type"], "video");
    assert_eq!(body["metadata"]["title"], "Never Gonna Give You Up");
    assert_eq!(body["metadata"]["url"], "https://youtu.be/dQw4w9WgXcQ");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_e2e_validate_playlist() {
    let fake = FakeDownloader::new("cat \"$(dirname \"$0\")/payload.json\"");
    fake.write_asset("payload.json", fixtures::PLAYLIST);
    let app = app(&fake);

    let (status, body) = post_json(
        &app,
        "/api/validate",
        json!({ "url": "https://www.youtube.com/playlist?list=PL123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["type"], "playlist");
    assert_eq!(body["metadata"]["count"], 4);
    assert_eq!(body["metadata"]["videos"][1]["id"], "bbbbbbbbbbb");
}

#[tokio::test]
async fn test_e2e_validate_rejections() {
    let fake = FakeDownloader::new("echo 'ERROR: Unsupported URL' >&2\nexit 1");
    let app = app(&fake);

    let (status, body) = post_json(&app, "/api/validate", json!({ "url": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "URL is required");

    let (status, body) = post_json(&app, "/api/validate", json!({ "url": "ftp://host/file" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], false);

    let (status, body) = post_json(&app, "/api/validate", json!({ "url": "https://example.com/x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid or unsupported video URL"));
    // Downloader diagnostics stay server-side.
    assert!(!body.to_string().contains("Unsupported URL"));
}

#[tokio::test]
async fn test_e2e_download_rejects_bad_selection() {
    let fake = FakeDownloader::new("exit 0");
    let app = app(&fake);

    let (status, body) = post_json(
        &app,
        "/api/download",
        json!({ "url": "https://vimeo.com/1", "format": "avi", "quality": "720" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid format. Must be mp4 or webm");

    let (status, body) = post_json(
        &app,
        "/api/download",
        json!({ "url": "https://vimeo.com/1", "format": "mp4", "quality": "4k" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid quality. Must be 1080, 720, 480, or audio");

    assert!(fake.invocations().is_empty());
}

#[tokio::test]
async fn test_e2e_unknown_job_is_not_found() {
    let fake = FakeDownloader::new("exit 0");
    let app = app(&fake);

    let (status, body) = get_json(&app, "/api/status/4f1c2d3e-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found. It may have expired.");

    let (status, _) = get_json(&app, "/api/status/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_e2e_file_download_guards() {
    let fake = FakeDownloader::new("exit 0");
    let app = app(&fake);

    let (status, body) = get_json(&app, "/api/download/..%2Fsecret.mp4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid filename");

    let (status, body) = get_json(&app, "/api/download/missing.mp4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found or has expired");
}

#[tokio::test]
async fn test_e2e_full_download_flow() {
    let fake = FakeDownloader::new(SUCCESSFUL_DOWNLOAD);
    let app = app(&fake);

    let (status, body) = post_json(
        &app,
        "/api/download",
        json!({ "url": "https://vimeo.com/1", "format": "mp4", "quality": "1080" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Download started");
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let status_body = loop {
        let (status, body) = get_json(&app, &format!("/api/status/{job_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let progress = body["progress"].as_u64().unwrap();
        assert!(progress <= 100);
        match body["status"].as_str().unwrap() {
            "ready" => break body,
            "failed" => panic!("job failed: {body}"),
            _ => {}
        }
        assert!(tokio::time::Instant::now() < deadline, "job never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(status_body["progress"], 100);
    let download_url = status_body["downloadUrl"].as_str().unwrap();
    assert_eq!(download_url, format!("/api/download/{job_id}.mp4"));

    let request = Request::get(download_url).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{job_id}.mp4\"").as_str()
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"video-bytes\n");
}

#[tokio::test]
async fn test_e2e_unknown_route() {
    let fake = FakeDownloader::new("exit 0");
    let app = app(&fake);

    let (status, body) = get_json(&app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}
