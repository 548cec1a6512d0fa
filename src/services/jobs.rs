use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::job::{Job, JobStatus, JobView, Quality, VideoFormat};

/// In-memory table of download jobs.
///
/// Each job has one writer (its supervisor task) and any number of readers.
/// Mutators silently ignore unknown ids so a task that outlives its record's
/// eviction cannot fail.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new `queued` job and return its id. Nothing runs it; use
    /// `JobSupervisor::create_download_job` to register and start a job.
    pub(crate) fn create(&self, url: &str, format: VideoFormat, quality: Quality) -> Uuid {
        let job = Job::new(url.to_string(), format, quality);
        let id = job.id;
        self.write().insert(id, job);
        id
    }

    /// Record progress; also moves the job to `processing`.
    pub fn update_progress(&self, id: Uuid, percent: u8, text: &str) {
        if let Some(job) = self.write().get_mut(&id) {
            job.status = JobStatus::Processing;
            job.progress = percent.min(100);
            job.status_text = text.to_string();
        }
    }

    /// Replace only the status label, keeping the current percentage.
    pub fn update_status_text(&self, id: Uuid, text: &str) {
        if let Some(job) = self.write().get_mut(&id) {
            job.status = JobStatus::Processing;
            job.status_text = text.to_string();
        }
    }

    pub fn update_status(&self, id: Uuid, status: JobStatus) {
        if let Some(job) = self.write().get_mut(&id) {
            job.status = status;
            if status == JobStatus::Failed {
                job.status_text = "Failed".to_string();
            }
        }
    }

    /// Terminal success: progress pinned to 100 and the download link set.
    pub fn mark_ready(&self, id: Uuid, filename: &str) {
        if let Some(job) = self.write().get_mut(&id) {
            job.status = JobStatus::Ready;
            job.progress = 100;
            job.status_text = "Ready".to_string();
            job.download_url = Some(format!("/api/download/{filename}"));
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobView> {
        self.read().get(&id).map(Job::view)
    }

    /// Source URL, format and quality of a job, if still present.
    pub fn request(&self, id: Uuid) -> Option<(String, VideoFormat, Quality)> {
        self.read()
            .get(&id)
            .map(|job| (job.source_url.clone(), job.format, job.quality))
    }

    /// Drop every job created more than `max_age` before `now`.
    pub fn evict_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| now.signed_duration_since(job.created_at) <= max_age);
        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}
