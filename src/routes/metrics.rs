use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — Prometheus text exposition of job counters.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for the metrics emitted by the job supervisor.
pub fn describe() {
    metrics::describe_counter!("download_jobs_total", "Total download jobs submitted");
    metrics::describe_counter!("download_jobs_completed", "Download jobs that produced a file");
    metrics::describe_counter!("download_jobs_failed", "Download jobs that ended in failure");
    metrics::describe_histogram!(
        "download_job_seconds",
        metrics::Unit::Seconds,
        "Wall-clock time from dispatch to terminal state"
    );
}
