use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use garde::Validate;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::download::{DownloadRequest, DownloadResponse, ValidateRequest, ValidateResponse};
use crate::models::job::JobView;
use crate::routes::ApiError;
use crate::services::validation::{parse_http_url, sanitize_input};

const UNSUPPORTED_VIDEO: &str = "Invalid or unsupported video URL. Please ensure the URL is correct and the video is publicly accessible.";

/// POST /api/validate — Resolve metadata for a URL.
pub async fn validate_url(
    State(state): State<AppState>,
    Json(mut req): Json<ValidateRequest>,
) -> (StatusCode, Json<ValidateResponse>) {
    req.url = sanitize_input(&req.url);

    let rejected = |error: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse {
                valid: false,
                metadata: None,
                error: Some(error),
            }),
        )
    };

    if req.validate().is_err() {
        return rejected("URL is required".to_string());
    }
    if let Err(e) = parse_http_url(&req.url) {
        return rejected(e.to_string());
    }

    match state.metadata.resolve(&req.url).await {
        Ok(metadata) => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                metadata: Some(metadata),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(url = %req.url, error = %e, "metadata fetch error");
            rejected(UNSUPPORTED_VIDEO.to_string())
        }
    }
}

/// POST /api/download — Start a download job.
pub async fn start_download(
    State(state): State<AppState>,
    Json(mut req): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    req.url = sanitize_input(&req.url);
    req.format = sanitize_input(&req.format);
    req.quality = sanitize_input(&req.quality);

    req.validate()
        .map_err(|report| ApiError::bad_request(first_message(&report)))?;
    parse_http_url(&req.url).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let (format, quality) = req.selection();
    let job_id = state.supervisor.create_download_job(&req.url, format, quality);
    tracing::info!(%job_id, url = %req.url, %format, %quality, "download job created");

    Ok(Json(DownloadResponse {
        job_id,
        message: "Download started".to_string(),
    }))
}

/// GET /api/status/{job_id} — Poll a job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    Uuid::parse_str(&job_id)
        .ok()
        .and_then(|id| state.jobs.get(id))
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found. It may have expired."))
}

/// GET /api/download/{filename} — Stream a finished file as an attachment.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_filename(&filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = state.supervisor.output_dir().join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found or has expired"));
        }
        Err(e) => {
            tracing::error!(file = %filename, error = %e, "file open failed");
            return Err(ApiError::internal("Failed to download file"));
        }
    };

    let len = file
        .metadata()
        .await
        .map_err(|_| ApiError::internal("Failed to download file"))?
        .len();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains(['/', '\\', '"'])
}

fn first_message(report: &garde::Report) -> String {
    report
        .iter()
        .next()
        .map(|(_, error)| error.message().to_string())
        .unwrap_or_else(|| "Invalid request".to_string())
}
