use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use bippi_dl::app_state::AppState;
use bippi_dl::config::AppConfig;
use bippi_dl::routes;
use bippi_dl::services::jobs::JobStore;
use bippi_dl::services::sweeper::{RetentionPolicy, RetentionSweeper};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing bippi-dl server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .expect("Failed to create output directory");

    let jobs = Arc::new(JobStore::new());
    let state = AppState::from_config(&config, jobs.clone());

    tracing::info!(
        downloader = %state.downloader_program().display(),
        output_dir = %config.output_dir.display(),
        cookies = config.cookies().is_some(),
        "Core services ready"
    );

    let sweeper = RetentionSweeper::new(
        jobs,
        config.output_dir.clone(),
        RetentionPolicy {
            max_age: config.retention(),
            interval: config.sweep_interval(),
            ..RetentionPolicy::default()
        },
    );
    let _sweeper_tasks = sweeper.spawn();
    tracing::info!("File cleanup scheduled");

    let app = routes::app(state, prometheus_handle);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

/// Resolves on SIGINT or SIGTERM. Running downloads are not awaited.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
