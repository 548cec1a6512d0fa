use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_jobs: usize,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub downloader: ComponentHealth,
    pub output_dir: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            detail: Some(detail.into()),
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// GET /health — downloader binary and output directory status.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let program = state.downloader_program();
    let downloader = match which::which(program) {
        Ok(path) => ComponentHealth::ok(path.display().to_string()),
        Err(_) => ComponentHealth::error(format!("{} not found", program.display())),
    };

    let dir = state.supervisor.output_dir();
    let output_dir = match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => ComponentHealth::ok(dir.display().to_string()),
        _ => ComponentHealth::error(format!("{} is not a directory", dir.display())),
    };

    let all_healthy = downloader.status == "ok" && output_dir.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_jobs: state.jobs.len(),
        checks: HealthChecks {
            downloader,
            output_dir,
        },
    };

    (status_code, Json(response))
}
