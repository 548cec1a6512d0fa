use serde::{Deserialize, Serialize};

/// Resolved description of a URL, either a single video or a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataResult {
    Video(VideoMetadata),
    Playlist(PlaylistMetadata),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistMetadata {
    pub title: Option<String>,
    pub count: usize,
    pub videos: Vec<PlaylistEntry>,
}

/// Lightweight descriptor of one playlist item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistEntry {
    pub title: Option<String>,
    pub id: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub url: String,
}

/// Subset of the `--dump-single-json` document that we read.
#[derive(Debug, Deserialize)]
pub(crate) struct RawInfo {
    #[serde(rename = "_type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub entries: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    pub title: Option<String>,
    pub id: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub url: Option<String>,
}
