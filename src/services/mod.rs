pub mod cookies;
pub mod format;
pub mod jobs;
pub mod metadata;
pub mod process;
pub mod progress;
pub mod supervisor;
pub mod sweeper;
pub mod validation;

use std::path::PathBuf;

use cookies::CookieJar;

/// How to invoke yt-dlp; shared by the metadata resolver and the supervisor.
#[derive(Debug, Clone)]
pub struct DownloaderSettings {
    pub program: PathBuf,
    pub cookies: CookieJar,
    /// Where per-request cookie files are written.
    pub scratch_dir: PathBuf,
}

impl DownloaderSettings {
    pub fn new(program: impl Into<PathBuf>, cookies: CookieJar) -> Self {
        Self {
            program: program.into(),
            cookies,
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Credentials and the mobile-client workaround apply to the same URLs.
    pub fn uses_credentials(&self, url: &str) -> bool {
        self.cookies.is_configured() && CookieJar::is_eligible(url)
    }
}
