use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    cookies::CookieJar, jobs::JobStore, metadata::MetadataResolver, supervisor::JobSupervisor,
    DownloaderSettings,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobStore>,
    pub supervisor: Arc<JobSupervisor>,
    pub metadata: Arc<MetadataResolver>,
}

impl AppState {
    pub fn new(jobs: Arc<JobStore>, supervisor: JobSupervisor, metadata: MetadataResolver) -> Self {
        Self {
            jobs,
            supervisor: Arc::new(supervisor),
            metadata: Arc::new(metadata),
        }
    }

    /// Wire the core services from configuration around `jobs`.
    pub fn from_config(config: &AppConfig, jobs: Arc<JobStore>) -> Self {
        let settings = DownloaderSettings::new(config.ytdlp_program(), CookieJar::new(config.cookies()));
        let supervisor = JobSupervisor::new(jobs.clone(), settings.clone(), config.output_dir.clone());
        let metadata = MetadataResolver::new(settings, config.metadata_timeout());
        Self::new(jobs, supervisor, metadata)
    }

    pub fn downloader_program(&self) -> &Path {
        self.supervisor.program()
    }
}
