use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Status of a download job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Ready,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }
}

/// Output container requested by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
}

/// Quality tier. `Audio` drops the video stream entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Default)]
pub enum Quality {
    #[serde(rename = "1080")]
    #[strum(serialize = "1080")]
    P1080,
    #[default]
    #[serde(rename = "720")]
    #[strum(serialize = "720")]
    P720,
    #[serde(rename = "480")]
    #[strum(serialize = "480")]
    P480,
    #[serde(rename = "audio")]
    #[strum(serialize = "audio")]
    Audio,
}

impl Quality {
    /// Maximum video height for this tier, `None` for audio-only.
    pub fn height(self) -> Option<u32> {
        match self {
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::Audio => None,
        }
    }

    /// Parses a tier, falling back to 720 for anything unrecognised.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

/// A download job as held by the job store.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub source_url: String,
    pub format: VideoFormat,
    pub quality: Quality,
    pub status: JobStatus,
    pub progress: u8,
    pub status_text: String,
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(source_url: String, format: VideoFormat, quality: Quality) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_url,
            format,
            quality,
            status: JobStatus::Queued,
            progress: 0,
            status_text: "Queued...".to_string(),
            download_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> JobView {
        JobView {
            status: self.status,
            progress: self.progress,
            status_text: self.status_text.clone(),
            download_url: self.download_url.clone(),
        }
    }
}

/// Read-only projection of a job returned to polling clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub status: JobStatus,
    pub progress: u8,
    pub status_text: String,
    pub download_url: Option<String>,
}
