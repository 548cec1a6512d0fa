use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use url::Url;

/// Hosts whose extractor accepts the site-wide cookie jar.
const ELIGIBLE_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Extractor argument selecting the mobile client, which trips fewer bot checks.
pub const COMPAT_ARGS: [&str; 2] = ["--extractor-args", "youtube:player_client=android"];

/// Site-wide credential blob, optionally configured.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    blob: Option<String>,
}

impl CookieJar {
    pub fn new(blob: Option<String>) -> Self {
        Self { blob }
    }

    pub fn is_configured(&self) -> bool {
        self.blob.is_some()
    }

    /// Whether `url` points at the platform the credentials belong to.
    pub fn is_eligible(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        ELIGIBLE_HOSTS
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }

    /// Write the blob into a fresh, uniquely named file under `dir`.
    ///
    /// Returns `None` when no blob is configured. The file lives exactly as
    /// long as the returned guard.
    pub fn materialize(&self, dir: &Path) -> std::io::Result<Option<CookieFile>> {
        let Some(blob) = &self.blob else {
            return Ok(None);
        };
        let mut file = tempfile::Builder::new()
            .prefix("cookies-")
            .suffix(".txt")
            .tempfile_in(dir)?;
        file.write_all(blob.as_bytes())?;
        file.flush()?;
        Ok(Some(CookieFile { file }))
    }
}

/// Scoped credential file; deleted on drop.
#[derive(Debug)]
pub struct CookieFile {
    file: NamedTempFile,
}

impl CookieFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `--cookies <path>` for the downloader.
    pub fn args(&self) -> [String; 2] {
        [
            "--cookies".to_string(),
            self.path().to_string_lossy().into_owned(),
        ]
    }
}
