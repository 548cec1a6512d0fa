//! Test helpers: a scripted stand-in for yt-dlp and job polling.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bippi_dl::models::job::JobView;
use bippi_dl::services::cookies::CookieJar;
use bippi_dl::services::jobs::JobStore;
use bippi_dl::services::DownloaderSettings;
use tempfile::TempDir;
use tokio::time::sleep;
use uuid::Uuid;

/// Cookie jar text used wherever credentials are configured.
pub const COOKIE_BLOB: &str = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n";

/// A shell script installed as the downloader.
///
/// Every invocation appends its arguments to `calls.log` (one per line, each
/// call terminated by `---`). When `--cookies` is passed and the file exists
/// at that moment, its path is appended to `cookies.log`. The script body
/// runs with `$out` set to the `-o` template and `$cookies` to the cookie path.
pub struct FakeDownloader {
    pub workspace: TempDir,
    pub program: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

impl FakeDownloader {
    pub fn new(body: &str) -> Self {
        let workspace = tempfile::tempdir().expect("create workspace");
        let output_dir = workspace.path().join("out");
        let scratch_dir = workspace.path().join("scratch");
        std::fs::create_dir_all(&output_dir).expect("create output dir");
        std::fs::create_dir_all(&scratch_dir).expect("create scratch dir");

        let calls = workspace.path().join("calls.log");
        let cookies = workspace.path().join("cookies.log");
        let script = format!(
            r#"#!/bin/sh
for a in "$@"; do printf '%s\n' "$a" >> "{calls}"; done
echo "---" >> "{calls}"
out=""
cookies=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    --cookies) cookies="$2"; shift ;;
  esac
  shift
done
if [ -n "$cookies" ] && [ -f "$cookies" ]; then echo "$cookies" >> "{cookie_log}"; fi
{body}
"#,
            calls = calls.display(),
            cookie_log = cookies.display(),
        );

        let program = workspace.path().join("yt-dlp");
        std::fs::write(&program, script).expect("write fake downloader");
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake downloader");

        Self {
            workspace,
            program,
            output_dir,
            scratch_dir,
        }
    }

    /// Store a file next to the script, e.g. a JSON payload to `cat`.
    pub fn write_asset(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.workspace.path().join(name);
        std::fs::write(&path, contents).expect("write asset");
        path
    }

    pub fn settings(&self, cookies: Option<&str>) -> DownloaderSettings {
        DownloaderSettings::new(&self.program, CookieJar::new(cookies.map(str::to_string)))
            .with_scratch_dir(&self.scratch_dir)
    }

    /// Arguments of each invocation, in order.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        let log = std::fs::read_to_string(self.workspace.path().join("calls.log")).unwrap_or_default();
        let mut calls = Vec::new();
        let mut current = Vec::new();
        for line in log.lines() {
            if line == "---" {
                calls.push(std::mem::take(&mut current));
            } else {
                current.push(line.to_string());
            }
        }
        calls
    }

    /// Cookie files that existed while the downloader ran.
    pub fn cookie_files_seen(&self) -> Vec<PathBuf> {
        std::fs::read_to_string(self.workspace.path().join("cookies.log"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }

    pub fn scratch_is_empty(&self) -> bool {
        dir_is_empty(&self.scratch_dir)
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

/// Script body that reports progress and writes `<id>.mp4`.
pub const SUCCESSFUL_DOWNLOAD: &str = r#"
echo "[youtube] abc: Downloading webpage"
echo "[download]   0.0% of 1.00MiB at 1.00MiB/s ETA 00:01"
echo "[download]  37.4% of 1.00MiB at 1.00MiB/s ETA 00:01"
echo "[download] 100% of 1.00MiB in 00:00:01"
echo "[Merger] Merging formats"
file=$(printf '%s' "$out" | sed 's/%(ext)s/mp4/')
echo "video-bytes" > "$file"
exit 0
"#;

/// Poll until the job reaches `ready` or `failed`, collecting every view seen.
pub async fn wait_for_terminal(store: &JobStore, id: Uuid, timeout: Duration) -> Vec<JobView> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut seen = Vec::new();
    loop {
        let view = store.get(id).expect("job must stay visible while polling");
        let done = view.status.is_terminal();
        seen.push(view);
        if done {
            return seen;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {id} did not finish within {timeout:?}"
        );
        sleep(Duration::from_millis(20)).await;
    }
}
