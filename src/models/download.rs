use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{Quality, VideoFormat};
use crate::models::metadata::MetadataResult;

/// Body of `POST /api/validate`.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateRequest {
    #[garde(length(min = 1, max = 2048))]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/download`.
#[derive(Debug, Deserialize, Validate)]
pub struct DownloadRequest {
    #[garde(length(min = 1, max = 2048))]
    pub url: String,

    #[garde(custom(known_format))]
    pub format: String,

    #[garde(custom(known_quality))]
    pub quality: String,
}

impl DownloadRequest {
    /// Typed format and quality. Only meaningful after `validate()` passed.
    pub fn selection(&self) -> (VideoFormat, Quality) {
        let format = self.format.parse().unwrap_or(VideoFormat::Mp4);
        (format, Quality::parse_or_default(&self.quality))
    }
}

fn known_format(value: &str, _: &()) -> garde::Result {
    value
        .parse::<VideoFormat>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid format. Must be mp4 or webm"))
}

fn known_quality(value: &str, _: &()) -> garde::Result {
    value
        .parse::<Quality>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid quality. Must be 1080, 720, 480, or audio"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub job_id: Uuid,
    pub message: String,
}
