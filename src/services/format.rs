use crate::models::job::{Quality, VideoFormat};

/// Selector passed to `-f` for the requested format and quality.
pub fn resolve_format_string(_format: VideoFormat, quality: Quality) -> String {
    match quality.height() {
        None => "bestaudio".to_string(),
        Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
    }
}

/// Post-processing flags that follow the format selector.
pub fn post_processing_args(format: VideoFormat, quality: Quality) -> Vec<String> {
    let mut args = Vec::new();
    if quality == Quality::Audio {
        args.extend(["-x", "--audio-format", "mp3"].map(String::from));
    }
    if format == VideoFormat::Mp4 {
        args.extend(["--merge-output-format", "mp4"].map(String::from));
    }
    args
}
