use std::sync::LazyLock;

use regex::Regex;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent pattern is valid")
});

/// Post-processing markers printed by yt-dlp once the transfer is done.
const MERGE_MARKERS: &[&str] = &["[Merger]", "[Fixup", "[ExtractAudio]", "[VideoConvertor]"];

pub const DOWNLOADING: &str = "Downloading...";
pub const FINALIZING: &str = "Finalizing...";
pub const MERGING: &str = "Converting & Merging...";

/// Progress information extracted from one chunk of downloader output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Whole percent in `0..=100`; `None` when the chunk only signals a phase.
    pub percent: Option<u8>,
    pub label: &'static str,
}

/// Scan a chunk of stdout. The last percentage in the chunk wins.
pub fn parse_chunk(chunk: &str) -> Option<ProgressUpdate> {
    let merging = MERGE_MARKERS.iter().any(|m| chunk.contains(m));
    let percent = PERCENT
        .captures_iter(chunk)
        .last()
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|pct| pct.clamp(0.0, 100.0).floor() as u8);

    let label = if merging {
        MERGING
    } else {
        match percent {
            Some(100) => FINALIZING,
            Some(_) => DOWNLOADING,
            None => return None,
        }
    };

    Some(ProgressUpdate { percent, label })
}
