use std::time::Duration;

use crate::models::metadata::{
    MetadataResult, PlaylistEntry, PlaylistMetadata, RawInfo, VideoMetadata,
};
use crate::services::cookies::{CookieFile, COMPAT_ARGS};
use crate::services::process::{self, DownloaderCommand, ProcessError};
use crate::services::validation::{self, UrlError};
use crate::services::DownloaderSettings;

/// Resolves a URL into video or playlist metadata via yt-dlp.
pub struct MetadataResolver {
    settings: DownloaderSettings,
    timeout: Duration,
}

/// Why a credentialed attempt failed; decides whether to retry without cookies.
#[derive(Debug)]
enum AttemptFailure {
    /// Worth one more try without credentials.
    AuthFailed(MetadataError),
    Fatal(MetadataError),
}

impl MetadataResolver {
    pub fn new(settings: DownloaderSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// Fetch metadata for `url`.
    ///
    /// With credentials configured and a YouTube URL, the first attempt uses a
    /// temporary cookie file. A non-timeout failure of that attempt is retried
    /// once without cookies and the retry's outcome is final.
    pub async fn resolve(&self, url: &str) -> Result<MetadataResult, MetadataError> {
        let url = validation::normalize_url(url)?;

        if !self.settings.uses_credentials(&url) {
            return self.attempt(&url, false, None).await;
        }

        match self.authenticated_attempt(&url).await {
            Ok(metadata) => Ok(metadata),
            Err(AttemptFailure::Fatal(e)) => Err(e),
            Err(AttemptFailure::AuthFailed(e)) => {
                tracing::warn!(error = %e, "authenticated metadata fetch failed, retrying without cookies");
                self.attempt(&url, true, None).await
            }
        }
    }

    async fn authenticated_attempt(&self, url: &str) -> Result<MetadataResult, AttemptFailure> {
        let cookie_file = self
            .settings
            .cookies
            .materialize(&self.settings.scratch_dir)
            .map_err(|e| AttemptFailure::AuthFailed(MetadataError::Upstream(e.to_string())))?;

        let result = self.attempt(url, true, cookie_file.as_ref()).await;
        // Deleted here whatever the outcome.
        drop(cookie_file);

        result.map_err(|e| match e {
            MetadataError::Timeout(_) => AttemptFailure::Fatal(e),
            other => AttemptFailure::AuthFailed(other),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        compat: bool,
        cookies: Option<&CookieFile>,
    ) -> Result<MetadataResult, MetadataError> {
        let mut cmd = DownloaderCommand::new(&self.settings.program).args([
            "--dump-single-json",
            "--flat-playlist",
            "--no-warnings",
        ]);
        if compat {
            cmd = cmd.args(COMPAT_ARGS);
        }
        if let Some(file) = cookies {
            cmd = cmd.args(file.args());
        }
        cmd = cmd.arg(url);

        tracing::debug!(url, authenticated = cookies.is_some(), "fetching metadata");

        let output = process::run_to_completion(&cmd, self.timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Timeout(limit) => MetadataError::Timeout(limit),
                other => MetadataError::Upstream(other.to_string()),
            })?;

        if !output.success() {
            tracing::warn!(code = ?output.code, stderr = %output.stderr.trim(), "metadata fetch failed");
            let detail = output.stderr.trim();
            return Err(MetadataError::Upstream(if detail.is_empty() {
                "Failed to fetch metadata".to_string()
            } else {
                detail.to_string()
            }));
        }

        parse_metadata(&output.stdout, url)
    }
}

/// Map a `--dump-single-json` document to a [`MetadataResult`].
pub fn parse_metadata(stdout: &str, canonical_url: &str) -> Result<MetadataResult, MetadataError> {
    let body = stdout.trim();
    if body.is_empty() {
        return Err(MetadataError::Upstream("No metadata received".to_string()));
    }

    let info: RawInfo = serde_json::from_str(body)
        .map_err(|_| MetadataError::Upstream("Parse error".to_string()))?;

    match (info.kind.as_deref(), info.entries) {
        (Some("playlist"), Some(entries)) => {
            let videos: Vec<PlaylistEntry> = entries
                .into_iter()
                .map(|entry| {
                    let url = entry.url.unwrap_or_else(|| {
                        format!(
                            "https://www.youtube.com/watch?v={}",
                            entry.id.as_deref().unwrap_or_default()
                        )
                    });
                    PlaylistEntry {
                        title: entry.title,
                        id: entry.id,
                        duration: entry.duration,
                        uploader: entry.uploader,
                        url,
                    }
                })
                .collect();

            Ok(MetadataResult::Playlist(PlaylistMetadata {
                title: info.title,
                count: videos.len(),
                videos,
            }))
        }
        _ => Ok(MetadataResult::Video(VideoMetadata {
            title: info.title,
            duration: info.duration,
            thumbnail: info.thumbnail,
            uploader: info.uploader,
            view_count: info.view_count,
            description: info.description,
            url: canonical_url.to_string(),
        })),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(#[from] UrlError),

    #[error("Metadata fetch timed out ({}s limit)", .0.as_secs())]
    Timeout(Duration),

    #[error("Downloader error: {0}")]
    Upstream(String),
}
