use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    #[garde(skip)]
    pub bind_addr: String,

    /// Listen port; overrides the port part of `bind_addr` when set.
    #[garde(skip)]
    pub port: Option<u16>,

    /// Directory that receives finished downloads.
    #[serde(default = "default_output_dir")]
    #[garde(skip)]
    pub output_dir: PathBuf,

    /// Path to the yt-dlp executable. Looked up on PATH when unset.
    #[garde(skip)]
    pub ytdlp_path: Option<PathBuf>,

    /// Netscape-format cookie jar text used for authenticated YouTube fetches.
    #[garde(skip)]
    pub ytdlp_cookies: Option<String>,

    /// Wall-clock limit for one metadata fetch attempt.
    #[serde(default = "default_metadata_timeout_secs")]
    #[garde(range(min = 1))]
    pub metadata_timeout_secs: u64,

    /// Age after which job records and output files are purged.
    #[serde(default = "default_retention_hours")]
    #[garde(skip)]
    pub retention_hours: u64,

    #[serde(default = "default_sweep_interval_secs")]
    #[garde(range(min = 1))]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_metadata_timeout_secs() -> u64 {
    30
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Address to listen on, honouring `PORT`.
    pub fn listen_addr(&self) -> String {
        match self.port {
            Some(port) => {
                let host = self
                    .bind_addr
                    .rsplit_once(':')
                    .map_or(self.bind_addr.as_str(), |(host, _)| host);
                format!("{host}:{port}")
            }
            None => self.bind_addr.clone(),
        }
    }

    /// Resolved downloader executable.
    pub fn ytdlp_program(&self) -> PathBuf {
        self.ytdlp_path
            .clone()
            .or_else(|| which::which("yt-dlp").ok())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }

    /// Blank cookie text counts as not configured.
    pub fn cookies(&self) -> Option<String> {
        self.ytdlp_cookies
            .as_ref()
            .filter(|c| !c.trim().is_empty())
            .cloned()
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(60 * 60))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
