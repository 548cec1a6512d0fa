use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use crate::services::jobs::JobStore;

/// Placeholder files that keep the output directory in version control.
const KEEP_FILES: &[&str] = &[".gitkeep", ".keep"];

const MIN_INTERVAL: Duration = Duration::from_secs(1);
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub interval: Duration,
    /// Delay before the first file sweep after start-up.
    pub startup_delay: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60),
            interval: Duration::from_secs(60 * 60),
            startup_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub errors: usize,
}

/// Purges expired output files and job records on a timer.
pub struct RetentionSweeper {
    store: Arc<JobStore>,
    output_dir: PathBuf,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(store: Arc<JobStore>, output_dir: PathBuf, policy: RetentionPolicy) -> Self {
        Self {
            store,
            output_dir,
            policy,
        }
    }

    /// Delete output files last modified more than `max_age` before `now`.
    pub async fn sweep_files(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(dir = %self.output_dir.display(), error = %e, "file cleanup failed");
                report.errors += 1;
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "file cleanup aborted while listing directory");
                    report.errors += 1;
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if KEEP_FILES.contains(&name.as_str()) {
                continue;
            }

            match self.expire_entry(&entry, now).await {
                Ok(Some(age)) => {
                    report.deleted += 1;
                    tracing::info!(file = %name, age_hours = age.as_secs() / 3600, "deleted expired file");
                }
                Ok(None) => {}
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(file = %name, error = %e, "error processing file");
                }
            }
        }

        tracing::info!(deleted = report.deleted, errors = report.errors, "file cleanup complete");
        report
    }

    /// Returns the file's age when it was deleted.
    async fn expire_entry(
        &self,
        entry: &tokio::fs::DirEntry,
        now: SystemTime,
    ) -> std::io::Result<Option<Duration>> {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            return Ok(None);
        }
        let age = now.duration_since(meta.modified()?).unwrap_or_default();
        if age <= self.policy.max_age {
            return Ok(None);
        }
        tokio::fs::remove_file(entry.path()).await?;
        Ok(Some(age))
    }

    /// Evict job records older than `max_age`.
    pub fn sweep_jobs(&self, now: chrono::DateTime<Utc>) -> usize {
        let evicted = self.store.evict_older_than(self.policy.max_age, now);
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.store.len(), "evicted stale jobs");
        }
        evicted
    }

    /// Run both duties forever: files once after the start-up delay and then
    /// every interval, jobs every interval. Returns the (files, jobs) tasks.
    pub fn spawn(self) -> (JoinHandle<()>, JoinHandle<()>) {
        let sweeper = Arc::new(self);

        let files = Arc::clone(&sweeper);
        let file_task = tokio::spawn(async move {
            tokio::time::sleep(files.policy.startup_delay).await;
            files.sweep_files(SystemTime::now()).await;

            let mut ticker = ticker(files.policy.interval);
            loop {
                ticker.tick().await;
                files.sweep_files(SystemTime::now()).await;
            }
        });

        let job_task = tokio::spawn(async move {
            let mut ticker = ticker(sweeper.policy.interval);
            loop {
                ticker.tick().await;
                sweeper.sweep_jobs(Utc::now());
            }
        });

        (file_task, job_task)
    }
}

/// Interval whose first tick is one period out. The period is clamped so a
/// zero or absurd value cannot panic the timer.
fn ticker(period: Duration) -> Interval {
    let period = period.clamp(MIN_INTERVAL, MAX_INTERVAL);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
