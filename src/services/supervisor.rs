use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::models::job::{JobStatus, Quality, VideoFormat};
use crate::services::cookies::{CookieFile, COMPAT_ARGS};
use crate::services::format::{post_processing_args, resolve_format_string};
use crate::services::jobs::JobStore;
use crate::services::process::{self, DownloaderCommand, ProcessError, ProcessExit};
use crate::services::progress;
use crate::services::DownloaderSettings;

/// Suffixes yt-dlp uses for in-flight files.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Runs download jobs: one background task per job, feeding the job store.
pub struct JobSupervisor {
    store: Arc<JobStore>,
    settings: DownloaderSettings,
    output_dir: PathBuf,
}

impl JobSupervisor {
    pub fn new(store: Arc<JobStore>, settings: DownloaderSettings, output_dir: PathBuf) -> Self {
        Self {
            store,
            settings,
            output_dir,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn program(&self) -> &Path {
        &self.settings.program
    }

    /// Register a job and start it in the background. Returns immediately.
    pub fn create_download_job(
        self: &Arc<Self>,
        url: &str,
        format: VideoFormat,
        quality: Quality,
    ) -> Uuid {
        let id = self.store.create(url, format, quality);
        metrics::counter!("download_jobs_total").increment(1);

        let supervisor = Arc::clone(self);
        tokio::spawn(
            async move { supervisor.run(id).await }
                .instrument(tracing::info_span!("download_job", job_id = %id)),
        );

        id
    }

    /// Drive one job to a terminal state. Errors end up as `failed`.
    pub async fn run(&self, id: Uuid) {
        let started = Instant::now();

        match self.process(id).await {
            Ok(filename) => {
                self.store.mark_ready(id, &filename);
                metrics::counter!("download_jobs_completed").increment(1);
                tracing::info!(file = %filename, elapsed_ms = started.elapsed().as_millis() as u64, "download ready");
            }
            Err(e) => {
                self.store.update_status(id, JobStatus::Failed);
                metrics::counter!("download_jobs_failed").increment(1);
                tracing::error!(error = %e, "download failed");
            }
        }

        metrics::histogram!("download_job_seconds").record(started.elapsed().as_secs_f64());
    }

    async fn process(&self, id: Uuid) -> Result<String, JobError> {
        let (url, format, quality) = self.store.request(id).ok_or(JobError::Evicted)?;
        self.store.update_progress(id, 0, "Starting...");

        let authenticated = self.settings.uses_credentials(&url);
        let cookie_file = if authenticated {
            self.settings
                .cookies
                .materialize(&self.settings.scratch_dir)
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "could not write cookie file, continuing without");
                    None
                })
        } else {
            None
        };

        let args = download_args(
            id,
            &url,
            format,
            quality,
            &self.output_dir,
            authenticated,
            cookie_file.as_ref(),
        );
        let cmd = DownloaderCommand::new(&self.settings.program).args(args);
        tracing::info!(args = ?cmd.get_args(), "starting download");

        let outcome = self.stream(id, &cmd).await;
        // Deleted on every exit path, including spawn failure.
        drop(cookie_file);

        let exit = outcome?;
        tracing::info!(code = ?exit.code, "downloader exited");
        if !exit.success() {
            return Err(JobError::DownloadFailed { code: exit.code });
        }

        find_output(&self.output_dir, id)
            .await?
            .ok_or(JobError::OutputFileMissing)
    }

    /// Feed stdout into the store in arrival order until the process exits.
    async fn stream(&self, id: Uuid, cmd: &DownloaderCommand) -> Result<ProcessExit, JobError> {
        let mut running = process::spawn_streaming(cmd)?;

        while let Some(line) = running.next_stdout_line().await? {
            tracing::trace!(line = %line, "downloader stdout");
            if let Some(update) = progress::parse_chunk(&line) {
                match update.percent {
                    Some(pct) => self.store.update_progress(id, pct, update.label),
                    None => self.store.update_status_text(id, update.label),
                }
            }
        }

        Ok(running.wait().await?)
    }
}

/// Full yt-dlp argument list for one job.
pub fn download_args(
    id: Uuid,
    url: &str,
    format: VideoFormat,
    quality: Quality,
    output_dir: &Path,
    compat: bool,
    cookies: Option<&CookieFile>,
) -> Vec<String> {
    let template = output_dir.join(format!("{id}.%(ext)s"));

    let mut args = vec![
        "--no-playlist".to_string(),
        "-f".to_string(),
        resolve_format_string(format, quality),
    ];
    args.extend(post_processing_args(format, quality));
    args.extend([
        "-o".to_string(),
        template.to_string_lossy().into_owned(),
        "--newline".to_string(),
        "-N".to_string(),
        "4".to_string(),
        "--buffer-size".to_string(),
        "16M".to_string(),
        "--resize-buffer".to_string(),
        "--force-ipv4".to_string(),
    ]);
    if compat {
        args.extend(COMPAT_ARGS.map(String::from));
    }
    if let Some(file) = cookies {
        args.extend(file.args());
    }
    args.push(url.to_string());
    args
}

/// Locate the finished file for `id`: `<id>.<ext>`, not a partial download.
pub async fn find_output(dir: &Path, id: Uuid) -> Result<Option<String>, JobError> {
    let prefix = format!("{id}.");
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with(&prefix)
            || name.contains(['/', '\\'])
            || PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
        {
            continue;
        }
        if entry.file_type().await?.is_file() {
            return Ok(Some(name));
        }
    }

    Ok(None)
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to start download process: {0}")]
    ProcessSpawn(#[source] std::io::Error),

    #[error("Download failed (exit code {code:?})")]
    DownloadFailed { code: Option<i32> },

    #[error("Downloader reported success but no output file was found")]
    OutputFileMissing,

    #[error("Job record was evicted before it started")]
    Evicted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessError> for JobError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::Spawn(e) => JobError::ProcessSpawn(e),
            ProcessError::Io(e) => JobError::Io(e),
            ProcessError::Timeout(_) => JobError::DownloadFailed { code: None },
        }
    }
}
